use domain::{CellSnapshot, GatewaySnapshot, ProcessState, PumpEntry, PumpSlot, RawDeviceReading};

#[test]
fn pump_slot_parses_known_names() {
    assert_eq!("pump1".parse::<PumpSlot>(), Ok(PumpSlot::Pump1));
    assert_eq!(" pump2 ".parse::<PumpSlot>(), Ok(PumpSlot::Pump2));
    assert!("pump3".parse::<PumpSlot>().is_err());
    assert_eq!(PumpSlot::Pump2.to_string(), "pump2");
}

#[test]
fn seed_depends_on_pump_role() {
    let first = ProcessState::seed(PumpSlot::Pump1);
    assert!(first.running);
    assert_eq!(first.speed, 50);

    let second = ProcessState::seed(PumpSlot::Pump2);
    assert!(!second.running);
    assert_eq!(second.speed, 0);
    assert_eq!(second.pressure_kpa, 0);
}

#[test]
fn missing_pump_entry_reads_as_offline_idle() {
    let cell = CellSnapshot {
        pumps: [(PumpSlot::Pump1, PumpEntry::online(RawDeviceReading::default()))]
            .into_iter()
            .collect(),
        process: domain::CellAggregate {
            flow_rate: 0,
            pressure_in: 0,
            pressure_out: 0,
            dirty_filters: false,
            control_valves: true,
        },
        errors: Vec::new(),
    };
    let entry = cell.pump(PumpSlot::Pump2);
    assert!(!entry.online);
    assert_eq!(entry.reading, RawDeviceReading::IDLE);
}

#[test]
fn default_snapshot_is_empty() {
    let snapshot = GatewaySnapshot::default();
    assert!(snapshot.updated_at_ms.is_none());
    assert!(snapshot.cell("cell01").is_none());
}
