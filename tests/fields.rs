mod support;

use sprocket::{
    DecodeOptions, FieldSource, Number, Standard, Value,
    avec::{decode_slice, slice::decode_with},
    sans::data::{BaseType, ValueError},
};
use support::{Builder, Counters, file_id};

fn unsigned(n: u64) -> Value {
    Value::Number(Number::Unsigned(n))
}

#[test]
fn partially_absent_arrays() {
    let data = file_id(Builder::new())
        .definition(1, 0xFF00, &[(1, 4, 0x02)])
        .data(1, &[0xFF, 5, 0xFF, 0xFF])
        .build();

    let file = decode_slice(&data).unwrap();
    let message = &file.messages[1];
    assert!(message.is_opaque());

    let value = &message.field(1).unwrap().value;
    assert_eq!(
        value,
        &Value::Array(vec![None, Some(Number::Unsigned(5)), None, None])
    );
    assert_eq!(value.elements().flatten().count(), 1);
}

#[test]
fn wholly_absent_arrays() {
    let data = file_id(Builder::new())
        .definition(1, 0xFF00, &[(1, 4, 0x02)])
        .data(1, &[0xFF; 4])
        .build();

    let file = decode_slice(&data).unwrap();
    assert!(file.messages[1].field(1).unwrap().value.is_absent());
    assert!(file.messages[1].value(1).is_none());
}

#[test]
fn compressed_timestamps() {
    let data = file_id(Builder::new())
        .definition(1, 20, &[(253, 4, 0x86), (3, 1, 0x02)])
        .data(1, &[0xFE, 0x03, 0, 0, 100])
        .definition(2, 20, &[(3, 1, 0x02)])
        .compressed(2, 2, &[101])
        .compressed(2, 5, &[102])
        .build();

    let file = decode_slice(&data).unwrap();
    let timestamps = file
        .messages_of(20)
        .map(|m| (m.timestamp, m.time_offset))
        .collect::<Vec<_>>();

    assert_eq!(
        timestamps,
        [(Some(1022), None), (Some(1026), Some(2)), (Some(1029), Some(5))]
    );
}

#[test]
fn explicit_timestamps_override_compressed_ones() {
    let data = file_id(Builder::new())
        .definition(1, 20, &[(253, 4, 0x86)])
        .data(1, &100u32.to_le_bytes())
        .compressed(1, 3, &200u32.to_le_bytes())
        .build();

    let file = decode_slice(&data).unwrap();
    assert_eq!(file.messages[2].timestamp, Some(200));
    assert_eq!(file.messages[2].time_offset, Some(3));
}

#[test]
fn component_counters_accumulate() {
    let data = file_id(Builder::new())
        .definition(1, 20, &[(18, 1, 0x02)])
        .data(1, &[250])
        .data(1, &[10])
        .data(1, &[20])
        .build();

    let file = decode_slice(&data).unwrap();
    let totals = file
        .messages_of(20)
        .map(|m| m.field(19).unwrap().raw.clone())
        .collect::<Vec<_>>();

    assert_eq!(totals, [250, 266, 276].map(unsigned));

    let cycles = file.messages[2].field(18).unwrap();
    assert_eq!(cycles.raw, unsigned(10));
    assert_eq!(
        file.messages[2].field(19).unwrap().source,
        FieldSource::Component { parent: 18 }
    );
}

#[test]
fn transmitted_counters_accumulate() {
    let data = file_id(Builder::new())
        .definition(1, 20, &[(19, 1, 0x02)])
        .data(1, &[250])
        .data(1, &[10])
        .data(1, &[20])
        .build();

    let file = decode_with(&data, &Counters, DecodeOptions::new()).unwrap();
    let totals = file
        .messages_of(20)
        .map(|m| m.field(19).unwrap().raw.clone())
        .collect::<Vec<_>>();

    assert_eq!(totals, [250, 266, 276].map(unsigned));
}

#[test]
fn transmitted_totals_are_kept_beside_components() {
    let data = file_id(Builder::new())
        .definition(1, 20, &[(18, 1, 0x02), (19, 4, 0x86)])
        .data(1, &[250, 0xE8, 0x03, 0, 0])
        .data(1, &[10, 0xF2, 0x03, 0, 0])
        .build();

    let file = decode_slice(&data).unwrap();
    let transmitted = file
        .messages_of(20)
        .map(|m| m.field(19).unwrap().raw.clone())
        .collect::<Vec<_>>();
    let components = file
        .messages_of(20)
        .flat_map(|m| m.fields.iter().filter(|f| f.number == 19 && f.is_component()))
        .map(|f| f.raw.clone())
        .collect::<Vec<_>>();

    assert_eq!(transmitted, [1000, 1010].map(unsigned));
    assert_eq!(components, [250, 266].map(unsigned));
}

#[test]
fn scaled_fields_and_components() {
    let data = file_id(Builder::new())
        .definition(1, 20, &[(2, 2, 0x84), (6, 2, 0x84), (8, 3, 0x0D)])
        .data(1, &[0xB8, 0x0B, 0xC4, 0x09, 0xFA, 0x00, 0x02])
        .build();

    let file = decode_slice(&data).unwrap();
    let record = &file.messages[1];

    let altitude = record.field(2).unwrap();
    assert_eq!(altitude.name, Some("altitude"));
    assert_eq!(altitude.units, "m");
    assert_eq!(altitude.raw, unsigned(3000));
    assert_eq!(altitude.value.get::<f64>(), Some(100.0));
    assert_eq!(record.value(78).and_then(Value::get::<f64>), Some(100.0));

    // Transmitted speed wins over the speed packed into field 8.
    assert_eq!(record.value(6).and_then(Value::get::<f64>), Some(2.5));
    assert_eq!(record.field(6).unwrap().source, FieldSource::Transmitted);
    assert_eq!(record.value(5).and_then(Value::get::<f64>), Some(2.0));
}

#[test]
fn components_can_be_disabled() {
    let data = file_id(Builder::new())
        .definition(1, 20, &[(2, 2, 0x84)])
        .data(1, &[0xB8, 0x0B])
        .build();

    let options = DecodeOptions::new().with_components(false);
    let file = decode_with(&data, &Standard, options).unwrap();
    assert!(file.messages[1].field(78).is_none());
}

#[test]
fn field_errors_stay_on_their_message() {
    let data = file_id(Builder::new())
        .definition(1, 20, &[(3, 1, 0x1F), (4, 1, 0x02), (0, 3, 0x85)])
        .data(1, &[1, 90, 0, 0, 0])
        .build();

    let file = decode_slice(&data).unwrap();
    let record = &file.messages[1];

    assert_eq!(record.errors.len(), 2);
    assert_eq!(record.errors[0].kind, ValueError::UnknownBaseType(0x1F));
    assert_eq!(
        record.errors[1].kind,
        ValueError::SizeMismatch { size: 3, width: 4 }
    );
    assert_eq!(record.value(4), Some(&unsigned(90)));
    assert_eq!(record.fields.len(), 1);
}

#[test]
fn unknown_and_padding_messages_are_opaque() {
    let data = file_id(Builder::new())
        .definition(1, 105, &[(0, 1, 0x02)])
        .data(1, &[7])
        .definition(2, 160, &[(253, 4, 0x86)])
        .data(2, &500u32.to_le_bytes())
        .build();

    let file = decode_slice(&data).unwrap();
    assert!(file.messages[1].is_opaque());
    assert_eq!(file.messages[1].field(0).unwrap().name, None);
    assert!(file.messages[2].is_opaque());
    assert_eq!(file.messages[2].timestamp, Some(500));
}

#[test]
fn big_endian_records() {
    let data = file_id(Builder::new())
        .big_endian_definition(1, 20, &[(253, 4, 0x86), (2, 2, 0x84), (0, 4, 0x85)])
        .data(1, &[0, 0, 0x03, 0xFE, 0x0B, 0xB8, 0xFF, 0xFF, 0xFF, 0xFE])
        .build();

    let file = decode_slice(&data).unwrap();
    let record = file.first(20).unwrap();
    assert_eq!(record.timestamp, Some(1022));
    assert_eq!(record.value(2).and_then(Value::get::<f64>), Some(100.0));
    assert_eq!(record.value(0).and_then(Value::get::<i32>), Some(-2));
}

#[test]
fn developer_fields() {
    let description = [
        &[0, 0, 0x84][..],
        b"power\0\0\0",
        &[10],
        b"W\0\0\0",
    ]
    .concat();

    let data = file_id(Builder::new())
        .definition(
            1,
            206,
            &[(0, 1, 0x02), (1, 1, 0x02), (2, 1, 0x02), (3, 8, 0x07), (6, 1, 0x02), (8, 4, 0x07)],
        )
        .data(1, &description)
        .developer_definition(2, 20, &[(3, 1, 0x02)], &[(0, 2, 0), (1, 2, 0)])
        .data(2, &[120, 0xE8, 0x03, 0x01, 0x02])
        .build();

    let file = decode_slice(&data).unwrap();
    let record = file.first(20).unwrap();

    let power = record.developer_field(0, 0).unwrap();
    assert_eq!(power.name.as_deref(), Some("power"));
    assert_eq!(power.units.as_deref(), Some("W"));
    assert_eq!(power.base_type, BaseType::UInt16);
    assert_eq!(power.raw, unsigned(1000));
    assert_eq!(power.value.get::<f64>(), Some(100.0));

    let undescribed = record.developer_field(0, 1).unwrap();
    assert_eq!(undescribed.name, None);
    assert_eq!(undescribed.base_type, BaseType::Byte);
    assert_eq!(undescribed.value, Value::Bytes(vec![1, 2]));
}

#[test]
fn strings_stop_at_the_terminator() {
    let data = Builder::new()
        .definition(0, 0, &[(8, 8, 0x07)])
        .data(0, b"edge\0xyz")
        .build();

    let file = decode_slice(&data).unwrap();
    assert_eq!(
        file.first(0).and_then(|m| m.value(8)).and_then(Value::get::<String>),
        Some(String::from("edge"))
    );
}
