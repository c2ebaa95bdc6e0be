use super::{
    Component, FieldMeta, MessageMeta, Profile, component, field,
};
use crate::sans::data::BaseType::*;

/// The built-in profile subset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standard;

impl Profile for Standard {
    fn message(&self, global: u16) -> Option<&MessageMeta> {
        MESSAGES
            .binary_search_by_key(&global, |m| m.number)
            .ok()
            .map(|i| &MESSAGES[i])
    }
}

/// Sorted by message number.
static MESSAGES: &[MessageMeta] = &[
    MessageMeta {
        number: 0,
        name: "file_id",
        fields: FILE_ID,
    },
    MessageMeta {
        number: 18,
        name: "session",
        fields: SESSION,
    },
    MessageMeta {
        number: 19,
        name: "lap",
        fields: LAP,
    },
    MessageMeta {
        number: 20,
        name: "record",
        fields: RECORD,
    },
    MessageMeta {
        number: 21,
        name: "event",
        fields: EVENT,
    },
    MessageMeta {
        number: 23,
        name: "device_info",
        fields: DEVICE_INFO,
    },
    MessageMeta {
        number: 34,
        name: "activity",
        fields: ACTIVITY,
    },
    MessageMeta {
        number: 49,
        name: "file_creator",
        fields: FILE_CREATOR,
    },
    MessageMeta {
        number: 78,
        name: "hrv",
        fields: HRV,
    },
    MessageMeta {
        number: 206,
        name: "field_description",
        fields: FIELD_DESCRIPTION,
    },
    MessageMeta {
        number: 207,
        name: "developer_data_id",
        fields: DEVELOPER_DATA_ID,
    },
];

const TIMESTAMP: FieldMeta = field(253, "timestamp", UInt32).units("s").timestamp();
const MESSAGE_INDEX: FieldMeta = field(254, "message_index", UInt16);

static FILE_ID: &[FieldMeta] = &[
    field(0, "type", Enum),
    field(1, "manufacturer", UInt16),
    field(2, "product", UInt16),
    field(3, "serial_number", UInt32z),
    field(4, "time_created", UInt32).units("s"),
    field(5, "number", UInt16),
    field(8, "product_name", String),
];

const AVG_SPEED: &[Component] = &[component(124, 0, 16).scaled(1000.0, 0.0)];

static SESSION: &[FieldMeta] = &[
    MESSAGE_INDEX,
    TIMESTAMP,
    field(0, "event", Enum),
    field(1, "event_type", Enum),
    field(2, "start_time", UInt32).units("s"),
    field(5, "sport", Enum),
    field(6, "sub_sport", Enum),
    field(7, "total_elapsed_time", UInt32)
        .scaled(1000.0, 0.0)
        .units("s"),
    field(8, "total_timer_time", UInt32)
        .scaled(1000.0, 0.0)
        .units("s"),
    field(9, "total_distance", UInt32)
        .scaled(100.0, 0.0)
        .units("m"),
    field(11, "total_calories", UInt16).units("kcal"),
    field(14, "avg_speed", UInt16)
        .scaled(1000.0, 0.0)
        .units("m/s")
        .components(AVG_SPEED),
    field(16, "avg_heart_rate", UInt8).units("bpm"),
    field(124, "enhanced_avg_speed", UInt32)
        .scaled(1000.0, 0.0)
        .units("m/s"),
];

static LAP: &[FieldMeta] = &[
    MESSAGE_INDEX,
    TIMESTAMP,
    field(0, "event", Enum),
    field(1, "event_type", Enum),
    field(2, "start_time", UInt32).units("s"),
    field(7, "total_elapsed_time", UInt32)
        .scaled(1000.0, 0.0)
        .units("s"),
    field(8, "total_timer_time", UInt32)
        .scaled(1000.0, 0.0)
        .units("s"),
    field(9, "total_distance", UInt32)
        .scaled(100.0, 0.0)
        .units("m"),
    field(11, "total_calories", UInt16).units("kcal"),
    field(15, "avg_heart_rate", UInt8).units("bpm"),
];

const ALTITUDE: &[Component] = &[component(78, 0, 16).scaled(5.0, 500.0)];
const SPEED: &[Component] = &[component(73, 0, 16).scaled(1000.0, 0.0)];
const COMPRESSED_SPEED_DISTANCE: &[Component] = &[
    component(6, 0, 12).scaled(100.0, 0.0),
    component(5, 12, 12).scaled(16.0, 0.0).accumulated(),
];
const CYCLES: &[Component] = &[component(19, 0, 8).accumulated()];
const COMPRESSED_ACCUMULATED_POWER: &[Component] = &[component(29, 0, 16).accumulated()];

static RECORD: &[FieldMeta] = &[
    TIMESTAMP,
    field(0, "position_lat", SInt32).units("semicircles"),
    field(1, "position_long", SInt32).units("semicircles"),
    field(2, "altitude", UInt16)
        .scaled(5.0, 500.0)
        .units("m")
        .components(ALTITUDE),
    field(3, "heart_rate", UInt8).units("bpm"),
    field(4, "cadence", UInt8).units("rpm"),
    field(5, "distance", UInt32).scaled(100.0, 0.0).units("m"),
    field(6, "speed", UInt16)
        .scaled(1000.0, 0.0)
        .units("m/s")
        .components(SPEED),
    field(7, "power", UInt16).units("watts"),
    field(8, "compressed_speed_distance", Byte).components(COMPRESSED_SPEED_DISTANCE),
    field(13, "temperature", SInt8).units("C"),
    field(18, "cycles", UInt8)
        .units("cycles")
        .components(CYCLES),
    field(19, "total_cycles", UInt32).units("cycles"),
    field(28, "compressed_accumulated_power", UInt16)
        .units("watts")
        .components(COMPRESSED_ACCUMULATED_POWER),
    field(29, "accumulated_power", UInt32).units("watts"),
    field(73, "enhanced_speed", UInt32)
        .scaled(1000.0, 0.0)
        .units("m/s"),
    field(78, "enhanced_altitude", UInt32)
        .scaled(5.0, 500.0)
        .units("m"),
];

static EVENT: &[FieldMeta] = &[
    TIMESTAMP,
    field(0, "event", Enum),
    field(1, "event_type", Enum),
    field(3, "data", UInt32),
    field(4, "event_group", UInt8),
];

static DEVICE_INFO: &[FieldMeta] = &[
    TIMESTAMP,
    field(0, "device_index", UInt8),
    field(2, "manufacturer", UInt16),
    field(3, "serial_number", UInt32z),
    field(4, "product", UInt16),
    field(5, "software_version", UInt16).scaled(100.0, 0.0),
    field(10, "battery_voltage", UInt16)
        .scaled(256.0, 0.0)
        .units("V"),
];

static ACTIVITY: &[FieldMeta] = &[
    TIMESTAMP,
    field(0, "total_timer_time", UInt32)
        .scaled(1000.0, 0.0)
        .units("s"),
    field(1, "num_sessions", UInt16),
    field(2, "type", Enum),
    field(3, "event", Enum),
    field(4, "event_type", Enum),
    field(5, "local_timestamp", UInt32).units("s"),
    field(6, "event_group", UInt8),
];

static FILE_CREATOR: &[FieldMeta] = &[
    field(0, "software_version", UInt16),
    field(1, "hardware_version", UInt8),
];

static HRV: &[FieldMeta] = &[field(0, "time", UInt16).scaled(1000.0, 0.0).units("s")];

static FIELD_DESCRIPTION: &[FieldMeta] = &[
    field(0, "developer_data_index", UInt8),
    field(1, "field_definition_number", UInt8),
    field(2, "fit_base_type_id", UInt8),
    field(3, "field_name", String),
    field(6, "scale", UInt8),
    field(7, "offset", SInt8),
    field(8, "units", String),
    field(14, "native_mesg_num", UInt16),
    field(15, "native_field_num", UInt8),
];

static DEVELOPER_DATA_ID: &[FieldMeta] = &[
    field(0, "developer_id", Byte),
    field(1, "application_id", Byte),
    field(2, "manufacturer_id", UInt16),
    field(3, "developer_data_index", UInt8),
    field(4, "application_version", UInt32),
];
