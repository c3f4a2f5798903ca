use std::path::Path;

use batsim::{
    battery::{telemetry::Channel, Battery, CHECKSUM, SENTINEL, VERSION},
    bus::{spawn_thread, Bus, BusHandle},
    config::Settings,
    driver::BatteryDriver,
    sink::RecordingSink,
};
use embedded_hal::blocking::i2c::{Read, Write};

fn sample_settings() -> Settings {
    Settings::load(Path::new(env!("CARGO_MANIFEST_DIR")).join("batteries.json")).unwrap()
}

fn start(settings: &Settings) -> (BusHandle, std::thread::JoinHandle<anyhow::Result<()>>) {
    let mut bus = Bus::new(settings.bus.i2c_bus.clone());
    for bat in &settings.batteries {
        bus.attach(bat.address, Battery::new(bat.id, RecordingSink::default()))
            .unwrap();
    }

    let (txn_tx, txn_rx) = flume::bounded(16);
    (BusHandle::new(txn_tx), spawn_thread(bus, txn_rx))
}

fn transact(handle: &mut BusHandle, address: u8, wbuf: &[u8]) -> u16 {
    handle.write(address, wbuf).unwrap();
    let mut rbuf = [0u8; 2];
    handle.read(address, &mut rbuf).unwrap();
    u16::from_le_bytes(rbuf)
}

#[test]
fn sample_config_describes_two_units() {
    let settings = sample_settings();
    assert_eq!(settings.bus.i2c_bus, "i2c_2");
    let addresses: Vec<u8> = settings.batteries.iter().map(|b| b.address).collect();
    assert_eq!(addresses, vec![0x2A, 0x2B]);
}

#[test]
fn probe_every_configured_unit() {
    let settings = sample_settings();
    let (handle, join) = start(&settings);

    for bat in &settings.batteries {
        let mut driver = BatteryDriver::new(handle.clone(), bat.address);
        let survey = driver.survey().unwrap();
        assert_eq!(survey.version, VERSION);
        assert_eq!(survey.checksum, CHECKSUM);
        assert_eq!(survey.board_status.bits(), 0);
        for (channel, reading) in survey.telemetry {
            assert_eq!(reading, channel.reading());
        }
    }

    drop(handle);
    join.join().unwrap().unwrap();
}

#[test]
fn fault_history_is_per_unit() {
    let settings = sample_settings();
    let (mut handle, join) = start(&settings);

    assert_eq!(transact(&mut handle, 0x2A, &[0x07, 0x00]), SENTINEL);
    assert_eq!(transact(&mut handle, 0x2B, &[0x10, 0x00, 0x01]), SENTINEL);

    let mut first = BatteryDriver::new(handle.clone(), 0x2A);
    let mut second = BatteryDriver::new(handle.clone(), 0x2B);

    // reading the status is itself a good command, so the command faults
    // are gone by the time it is reported
    assert_eq!(first.get_board_status().unwrap().bits(), 0);
    assert!(second.get_board_status().unwrap().invalid_channel());

    let [hi, lo] = Channel::Daughterboard4Heater.code().to_be_bytes();
    assert_eq!(transact(&mut handle, 0x2B, &[0x10, hi, lo]), 530);
    assert_eq!(second.get_board_status().unwrap().bits(), 0);

    drop(first);
    drop(second);
    drop(handle);
    join.join().unwrap().unwrap();
}
