use rule_shape::{compile, CompileError, Schema, TypeDescriptor};
use serde_json::{json, Value};

type D = TypeDescriptor;

fn infer(schema: Value) -> D {
    let schema = Schema::from_value(schema).unwrap();
    match compile(&schema) {
        Ok(d) => d,
        Err(errors) => panic!("{errors}"),
    }
}

fn lit(v: Value) -> D {
    D::of_value(&v)
}

fn widened(d: D) -> D {
    D::union([d.clone(), D::array_of(d)])
}

fn obj(fields: Vec<(&str, D)>) -> D {
    D::object_of(fields)
}

#[test]
fn sanitizer_types() {
    let d = infer(json!({
        "array": { "toArray": true },
        "int": { "toInt": true },
        "float": { "toFloat": true },
        "boolean": { "toBoolean": true },
        "date": { "toDate": true },
        "ltrim": { "ltrim": true },
        "rtrim": { "rtrim": true },
        "trim": { "trim": true },
        "lowerCase": { "toLowerCase": true },
        "upperCase": { "toUpperCase": true },
        "escape": { "escape": true },
        "unescape": { "unescape": true },
        "customSanitizer": {
            "customSanitizer": { "returns": { "type": "object", "properties": { "any": { "const": "type" } } } }
        },
        "opaqueSanitizer": { "customSanitizer": {} },
    }));
    assert_eq!(
        d,
        obj(vec![
            ("array", D::array_of(D::Unknown)),
            ("int", D::integer()),
            ("float", D::float()),
            ("boolean", D::boolean()),
            ("date", D::date()),
            ("ltrim", D::string()),
            ("rtrim", D::string()),
            ("trim", D::string()),
            ("lowerCase", D::string()),
            ("upperCase", D::string()),
            ("escape", D::string()),
            ("unescape", D::string()),
            ("customSanitizer", obj(vec![("any", lit(json!("type")))])),
            ("opaqueSanitizer", D::Unknown),
        ])
    );
}

#[test]
fn validator_types() {
    let string_validators = [
        "isString", "isULID", "isAlpha", "isAlphanumeric", "isAscii", "isBase32", "isBase58",
        "isBase64", "isBtcAddress", "isCreditCard", "isCurrency", "isEmail", "isISO6346",
        "isISO4217", "isISO8601",
    ];
    let mut schema = serde_json::Map::new();
    for name in string_validators {
        schema.insert(name.to_string(), json!({ name: true }));
    }
    schema.insert("int".into(), json!({ "isInt": true }));
    schema.insert("float".into(), json!({ "isFloat": true }));
    schema.insert("boolean".into(), json!({ "isBoolean": true }));
    schema.insert("date".into(), json!({ "isDate": true }));
    schema.insert("object".into(), json!({ "isObject": true }));
    schema.insert("custom".into(), json!({ "custom": { "returns": "string" } }));
    schema.insert("customWithoutAssert".into(), json!({ "custom": {} }));

    let d = infer(Value::Object(schema));
    for name in string_validators {
        assert_eq!(d.field(name), Some(&widened(D::string())), "{name}");
    }
    assert_eq!(d.field("int"), Some(&widened(D::integer())));
    assert_eq!(d.field("float"), Some(&widened(D::float())));
    assert_eq!(d.field("boolean"), Some(&widened(D::boolean())));
    assert_eq!(d.field("date"), Some(&widened(D::date())));
    assert_eq!(d.field("object"), Some(&D::empty_object()));
    assert_eq!(d.field("custom"), Some(&D::string()));
    assert_eq!(d.field("customWithoutAssert"), Some(&D::Unknown));
}

#[test]
fn array_types() {
    let d = infer(json!({
        "isArray": { "isArray": true },
        "toArray": { "toArray": true },
        "isArrayString": { "isArray": true, "isString": true },
        "toArrayString": { "toArray": true, "isString": true },
    }));
    assert_eq!(
        d,
        obj(vec![
            ("isArray", D::array_of(D::Unknown)),
            ("toArray", D::array_of(D::Unknown)),
            ("isArrayString", D::array_of(D::string())),
            ("toArrayString", D::array_of(D::string())),
        ])
    );
}

#[test]
fn optional_types() {
    let d = infer(json!({
        "optionalTrue": { "toInt": true, "optional": true },
        "optionalValueUndefinedString": { "toInt": true, "optional": { "options": { "values": "undefined" } } },
        "optionalValueNull": { "toInt": true, "optional": { "options": { "values": "null" } } },
        "optionalValueFalsy": { "toInt": true, "optional": { "options": { "values": "falsy" } } },
        "optionalNullable": { "toInt": true, "optional": { "options": { "nullable": true } } },
        "optionalCheckFalsy": { "toInt": true, "optional": { "options": { "checkFalsy": true } } },
        "optionalEmptyObject": { "toInt": true, "optional": {} },
        "optionalEmptyOptions": { "toInt": true, "optional": { "options": {} } },
        "onlyDefault": { "default": { "options": 1 } },
        "defaultWithOptional": { "optional": true, "default": { "options": 1 } },
    }));
    let undef = D::union([D::integer(), D::undefined()]);
    let nullish = D::union([D::integer(), D::null(), D::undefined()]);
    let falsy = D::union([
        D::integer(),
        lit(json!("")),
        lit(json!(0)),
        lit(json!(false)),
        D::null(),
        D::undefined(),
    ]);
    assert_eq!(
        d,
        obj(vec![
            ("optionalTrue", undef.clone()),
            ("optionalValueUndefinedString", undef.clone()),
            ("optionalValueNull", nullish.clone()),
            ("optionalValueFalsy", falsy.clone()),
            ("optionalNullable", nullish),
            ("optionalCheckFalsy", falsy),
            ("optionalEmptyObject", undef.clone()),
            ("optionalEmptyOptions", undef),
            ("onlyDefault", lit(json!(1))),
            ("defaultWithOptional", lit(json!(1))),
        ])
    );
}

#[test]
fn is_in_types() {
    let d = infer(json!({ "isIn": { "isIn": { "options": [["a", "b", "c"]] } } }));
    assert_eq!(
        d.field("isIn"),
        Some(&D::union([lit(json!("a")), lit(json!("b")), lit(json!("c"))]))
    );
    assert_eq!(d.field("isIn").unwrap().to_string(), r#""a" | "b" | "c""#);
}

#[test]
fn object_shapes() {
    let d = infer(json!({
        "user.name.first": { "isString": true, "trim": true },
        "user.name.middle": { "isString": true, "trim": true, "optional": true },
        "user.name.last": { "isString": true, "trim": true },
        "user.name.nicknames": { "isArray": true, "isString": true, "optional": true },

        "split.names.*.first": { "isString": true, "trim": true },
        "split.names.*.middle": { "isString": true, "optional": true, "trim": true },
        "split.names.*.last": { "isString": true, "trim": true },
        "split.names.*.nicknames": { "isArray": true, "isString": true, "optional": true },
    }));
    let name = obj(vec![
        ("first", D::string()),
        ("middle", D::union([D::string(), D::undefined()])),
        ("last", D::string()),
        ("nicknames", D::union([D::array_of(D::string()), D::undefined()])),
    ]);
    assert_eq!(
        d,
        obj(vec![
            ("user", obj(vec![("name", name.clone())])),
            ("split", obj(vec![("names", D::array_of(name))])),
        ])
    );
    assert_eq!(
        d.field("split").unwrap().to_string(),
        "{ names: { first: string; last: string; middle: string | undefined; nicknames: undefined | string[] }[] }"
    );
}

#[test]
fn round_trip_nested_keys() {
    let d = infer(json!({ "a.b": { "isString": true }, "a.c": { "isInt": true } }));
    assert_eq!(d, obj(vec![("a", obj(vec![("b", D::string()), ("c", D::integer())]))]));
}

#[test]
fn wildcard_leaf_is_array() {
    let d = infer(json!({ "items.*": { "isString": true } }));
    assert_eq!(d, obj(vec![("items", D::array_of(D::string()))]));
}

#[test]
fn check_falsy_absence() {
    let d = infer(json!({ "x": { "toInt": true, "optional": { "options": { "checkFalsy": true } } } }));
    assert_eq!(d.field("x").unwrap().to_string(), r#"integer | undefined | null | false | 0 | """#);
}

#[test]
fn conflicting_declarations_name_both_paths() {
    let schema = Schema::from_value(json!({ "x": { "isString": true }, "x.y": { "isInt": true } })).unwrap();
    let errors = compile(&schema).unwrap_err();
    assert_eq!(errors.len(), 1);
    let CompileError::ShapeConflict { left_source, right_source, .. } = &errors.0[0] else {
        panic!("expected a shape conflict, got {errors}");
    };
    assert_eq!((left_source.as_str(), right_source.as_str()), ("x", "x.y"));
    let message = errors.to_string();
    assert!(message.contains("`x`") && message.contains("`x.y`"), "{message}");
}

#[test]
fn inline_is_object_merges_with_dotted_children() {
    let d = infer(json!({ "obj": { "isObject": true }, "obj.a": { "isString": true } }));
    assert_eq!(d, obj(vec![("obj", obj(vec![("a", D::string())]))]));
}

#[test]
fn result_is_independent_of_declaration_order() {
    let forward = json!({
        "tags": { "isArray": true },
        "tags.*.label": { "trim": true },
        "tags.*.weight": { "toFloat": true, "optional": { "options": { "nullable": true } } },
        "meta": { "isObject": true },
        "meta.owner.id": { "toInt": true },
    });
    let mut reversed = serde_json::Map::new();
    for (k, v) in forward.as_object().unwrap().iter().rev() {
        reversed.insert(k.clone(), v.clone());
    }
    assert_eq!(infer(forward), infer(Value::Object(reversed)));
}

#[test]
fn every_error_is_reported() {
    let schema = Schema::from_value(json!({
        "": { "isInt": true },
        "a": { "isIn": { "options": ["a"] } },
        "b": { "toInt": true },
        "b.c": { "trim": true },
        "d.*": { "trim": true },
        "d.e": { "trim": true },
    }))
    .unwrap();
    let errors = compile(&schema).unwrap_err();
    let paths: Vec<_> = errors.iter().map(CompileError::path).collect();
    assert_eq!(paths, vec!["", "a", "d.*", "b"]);
}

#[test]
fn inline_validator_on_wildcard_node_is_an_array() {
    let d = infer(json!({ "items": { "isString": true }, "items.*": { "isString": true } }));
    assert!(matches!(d.field("items"), Some(TypeDescriptor::ArrayOf(_))), "{d}");
    assert_eq!(d, obj(vec![("items", D::array_of(D::string()))]));
}

#[test]
fn repeated_declarations_compile_the_same_in_any_order() {
    let toint = || rule_shape::FieldDeclaration::new().rule("toInt", true);
    let declarations = [
        toint(),
        rule_shape::FieldDeclaration::new().rule("trim", true).rule("optional", true),
        toint().rule("optional", json!({ "options": { "nullable": true } })),
    ];
    let forward: Schema = declarations.iter().cloned().map(|d| ("x", d)).collect();
    let backward: Schema = declarations.iter().rev().cloned().map(|d| ("x", d)).collect();
    assert!(compile(&forward).is_err());
    assert!(compile(&backward).is_err());

    let compatible = [toint(), toint().rule("optional", true)];
    let forward: Schema = compatible.iter().cloned().map(|d| ("x", d)).collect();
    let backward: Schema = compatible.iter().rev().cloned().map(|d| ("x", d)).collect();
    let expected = obj(vec![("x", D::union([D::integer(), D::undefined()]))]);
    assert_eq!(compile(&forward).unwrap(), expected);
    assert_eq!(compile(&backward).unwrap(), expected);
}
