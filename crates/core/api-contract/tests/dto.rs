use api_contract::{
    CellDetailDto, CellDto, DeviceErrorDto, LocalTagsDto, ProcessDto, PumpDto, SnapshotDto,
};
use serde_json::json;
use std::collections::BTreeMap;

fn cell() -> CellDto {
    let mut pumps = BTreeMap::new();
    pumps.insert(
        "pump1".to_string(),
        PumpDto {
            run: true,
            speed: 50,
            temp_c_x10: 160,
            kpa: 3250,
            online: true,
        },
    );
    CellDto {
        pumps,
        process: ProcessDto {
            flow_rate: 20,
            pressure_in: 3250,
            pressure_out: 3737,
            dirty_filters: false,
            control_valves: true,
        },
        errors: vec![DeviceErrorDto {
            pump: "pump2".to_string(),
            message: "connect error: refused".to_string(),
        }],
    }
}

#[test]
fn pump_fields_are_camel_case() {
    let value = serde_json::to_value(&cell()).expect("serialize");
    let pump = &value["pumps"]["pump1"];
    assert_eq!(pump["tempCX10"], 160);
    assert_eq!(pump["kpa"], 3250);
    assert!(pump.get("temp_c_x10").is_none());
    assert_eq!(value["process"]["flowRate"], 20);
    assert_eq!(value["process"]["pressureOut"], 3737);
    assert_eq!(value["process"]["controlValves"], true);
    assert_eq!(value["errors"][0]["pump"], "pump2");
}

#[test]
fn empty_snapshot_has_null_timestamp() {
    let value = serde_json::to_value(SnapshotDto {
        updated_at_ms: None,
        cells: BTreeMap::new(),
    })
    .expect("serialize");
    assert_eq!(value, json!({"updatedAtMs": null, "cells": {}}));
}

#[test]
fn cell_detail_is_flattened() {
    let value = serde_json::to_value(CellDetailDto {
        cell: "cell01".to_string(),
        updated_at_ms: Some(1_700_000_000_000),
        detail: cell(),
    })
    .expect("serialize");
    assert_eq!(value["cell"], "cell01");
    assert_eq!(value["updatedAtMs"], 1_700_000_000_000i64);
    assert!(value.get("pumps").is_some());
    assert!(value.get("process").is_some());
    assert!(value.get("detail").is_none());
}

#[test]
fn local_tags_shape() {
    let value = serde_json::to_value(LocalTagsDto {
        cell_id: "cell03".to_string(),
        pump: "pump2".to_string(),
        run: false,
        speed: 0,
        temp_c_x10: -12,
        kpa: 0,
    })
    .expect("serialize");
    assert_eq!(
        value,
        json!({"cellId": "cell03", "pump": "pump2", "run": false, "speed": 0, "tempCX10": -12, "kpa": 0})
    );
}
