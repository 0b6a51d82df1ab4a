/// Builds a text-named [`DsonValue`](crate::DsonValue) from a JSON-like literal.
///
/// Integer literals become `Int32`, float literals `Double`. Prefix an object
/// or array with `@Name` to give it a class id.
///
/// ```rust
/// use dson::{dson, DsonValue};
///
/// let point = dson!(@Point { "x": 1, "y": 2 });
/// let obj = point.as_object().unwrap();
/// assert_eq!(obj.class_id.as_deref(), Some("Point"));
/// assert_eq!(obj.fields.get("x"), Some(&DsonValue::Int32(1)));
/// ```
#[macro_export]
macro_rules! dson {
    (null) => {
        $crate::DsonValue::<::std::string::String>::Null
    };

    (true) => {
        $crate::DsonValue::<::std::string::String>::Bool(true)
    };

    (false) => {
        $crate::DsonValue::<::std::string::String>::Bool(false)
    };

    ([]) => {
        $crate::DsonValue::<::std::string::String>::Array($crate::DsonArray::new())
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::DsonValue::<::std::string::String>::Array($crate::DsonArray::from(
            ::std::vec![$($crate::dson!($elem)),*],
        ))
    };

    (@ $class:ident [ $($elem:tt),* $(,)? ]) => {
        $crate::DsonValue::<::std::string::String>::Array(
            $crate::DsonArray::from(::std::vec![$($crate::dson!($elem)),*])
                .with_class_id(::std::string::String::from(stringify!($class))),
        )
    };

    ({}) => {
        $crate::DsonValue::<::std::string::String>::Object($crate::DsonObject::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::DsonObject::<::std::string::String>::new();
        $(
            object.insert($key.to_string(), $crate::dson!($value));
        )*
        $crate::DsonValue::Object(object)
    }};

    (@ $class:ident { $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::DsonObject::<::std::string::String>::new()
            .with_class_id(::std::string::String::from(stringify!($class)));
        $(
            object.insert($key.to_string(), $crate::dson!($value));
        )*
        $crate::DsonValue::Object(object)
    }};

    // Any other expression goes through `From`
    ($s:expr) => {
        $crate::DsonValue::<::std::string::String>::from($s)
    };
}

#[cfg(test)]
mod tests {
    use crate::{DsonObject, DsonValue};

    #[test]
    fn test_dson_macro_primitives() {
        assert_eq!(dson!(null), DsonValue::Null);
        assert_eq!(dson!(true), DsonValue::Bool(true));
        assert_eq!(dson!(42), DsonValue::Int32(42));
        assert_eq!(dson!(3.5), DsonValue::Double(3.5));
        assert_eq!(dson!(7i64), DsonValue::Int64(7));
        assert_eq!(dson!("hello"), DsonValue::String("hello".to_string()));
    }

    #[test]
    fn test_dson_macro_arrays() {
        let arr = dson!([1, "two", null]);
        let arr = arr.as_array().unwrap();
        assert_eq!(arr.elements.len(), 3);
        assert_eq!(arr.elements[1], DsonValue::from("two"));
        assert!(arr.class_id.is_none());

        let typed = dson!(@Pair [1, 2]);
        assert_eq!(typed.as_array().unwrap().class_id.as_deref(), Some("Pair"));
    }

    #[test]
    fn test_dson_macro_objects() {
        assert_eq!(dson!({}), DsonValue::Object(DsonObject::new()));

        let obj = dson!({
            "name": "Alice",
            "nested": { "ok": true }
        });
        let obj = obj.as_object().unwrap();
        assert_eq!(obj.fields.len(), 2);
        let nested = obj.fields.get("nested").and_then(|v| v.as_object()).unwrap();
        assert_eq!(nested.fields.get("ok"), Some(&DsonValue::Bool(true)));
    }
}
