#![cfg(feature = "serde")]

use bt_core::{BrainConfig, Value};

#[test]
fn brain_config_fills_missing_fields_with_defaults() {
    let config: BrainConfig =
        serde_json::from_str(r#"{"think_every_ticks": 4}"#).expect("deserialize");
    assert_eq!(config.think_every_ticks, 4);
    assert_eq!(config.think_offset_ticks, 0);
}

#[test]
fn values_keep_their_kind_through_json() {
    let values = vec![
        Value::Bool(true),
        Value::Int(-3),
        Value::Float(0.5),
        Value::String("Enemy".to_string()),
        Value::Handle(77),
    ];
    let json = serde_json::to_string(&values).expect("serialize");
    let back: Vec<Value> = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, values);
}
