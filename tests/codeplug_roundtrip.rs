//! Whole-codeplug round trip: build a configuration graph, serialize it to
//! YAML, parse it back and check that fields, cross-references and derived
//! views all survive.

use std::rc::Rc;

use codeplug::{
    handle, CallType, Channel, ChannelList, Config, ConfigError, ConfigItem, Contact, GroupList,
    Handle, PositioningSystem, Power, RadioId, RoamingZone, ScanList, TimeSlot, Zone,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("codeplug=debug").try_init();
}

/// Builds a small but fully linked codeplug.
fn sample_config() -> Config {
    let config = Config::new();

    let id = handle(RadioId::new("DM3MAT", 2621370).unwrap());
    config.radio_ids().add(Rc::clone(&id), None).unwrap();

    let ww = handle(Contact::digital("Worldwide", CallType::GroupCall, 91, false).unwrap());
    let regional = handle(Contact::digital("Regional", CallType::GroupCall, 8, false).unwrap());
    let gate = handle(Contact::dtmf("Gate", "*123#", true).unwrap());
    config.contacts().add(Rc::clone(&ww), None).unwrap();
    config.contacts().add(Rc::clone(&gate), None).unwrap();
    config.contacts().add(Rc::clone(&regional), None).unwrap();

    let mut grp = GroupList::new("Berlin").unwrap();
    grp.contacts_mut().add(&ww).unwrap();
    grp.contacts_mut().add(&regional).unwrap();
    let grp = handle(grp);
    config.group_lists().add(Rc::clone(&grp), None).unwrap();

    let aprs = handle(PositioningSystem::aprs("APRS 2m", "DM3MAT-7", "WIDE1-1", 300).unwrap());
    config.positioning().add(Rc::clone(&aprs), None).unwrap();

    let mut digital = Channel::digital("TG91 Berlin", 439.563, 431.963).unwrap();
    digital.set_power(Power::High);
    digital.set_timeout(45).unwrap();
    {
        let settings = digital.digital_settings_mut().unwrap();
        settings.set_color_code(1).unwrap();
        settings.set_time_slot(TimeSlot::TS2);
        settings.group_list().set(Some(&grp)).unwrap();
        settings.tx_contact().set(Some(&ww)).unwrap();
        settings.radio_id().set(Some(&id)).unwrap();
    }
    let digital = handle(digital);

    let mut analog = Channel::analog("Simplex 2m", 145.500, 145.500).unwrap();
    analog.disable_vox();
    {
        let settings = analog.analog_settings_mut().unwrap();
        settings.set_squelch(3).unwrap();
        settings.aprs().set(Some(&aprs)).unwrap();
    }
    let analog = handle(analog);

    config.channels().add(Rc::clone(&digital), None).unwrap();
    config.channels().add(Rc::clone(&analog), None).unwrap();

    let mut scan = ScanList::new("Sweep").unwrap();
    scan.channels_mut().add(&digital).unwrap();
    scan.channels_mut().add(&analog).unwrap();
    let scan = handle(scan);
    config.scan_lists().add(Rc::clone(&scan), None).unwrap();
    digital.borrow_mut().scan_list().set(Some(&scan)).unwrap();

    let mut zone = Zone::new("Berlin").unwrap();
    zone.channels_mut().add(&digital).unwrap();
    zone.channels_mut().add(&analog).unwrap();
    config.zones().add(handle(zone), None).unwrap();

    let mut roam = RoamingZone::new("BM Berlin").unwrap();
    roam.channels_mut().add(&digital).unwrap();
    config.roaming().add(handle(roam), None).unwrap();

    config
}

#[test]
fn yaml_round_trip_preserves_fields_and_links() {
    init_tracing();
    let original = sample_config();
    let yaml = original.to_yaml().unwrap();
    let restored = Config::from_yaml(&yaml).unwrap();

    assert_eq!(restored.radio_ids().len(), 1);
    assert_eq!(restored.contacts().len(), 3);
    assert_eq!(restored.contacts().digital_count(), 2);
    assert_eq!(restored.contacts().dtmf_count(), 1);
    assert_eq!(restored.channels().len(), 2);
    assert_eq!(restored.zones().len(), 1);
    assert_eq!(restored.scan_lists().len(), 1);
    assert_eq!(restored.roaming().len(), 1);

    let id = restored.radio_ids().get(0).unwrap();
    assert_eq!(id.borrow().name(), "DM3MAT");
    assert_eq!(id.borrow().number(), 2621370);

    let digital: Handle<Channel> = restored.channels().get(0).unwrap();
    let analog: Handle<Channel> = restored.channels().get(1).unwrap();
    {
        let ch = digital.borrow();
        assert_eq!(ch.name(), "TG91 Berlin");
        assert_eq!(ch.rx_frequency(), 439.563);
        assert_eq!(ch.tx_frequency(), 431.963);
        assert_eq!(ch.power(), Some(Power::High));
        assert_eq!(ch.timeout().value(), Some(45));

        let settings = ch.digital_settings().unwrap();
        assert_eq!(settings.color_code(), 1);
        assert_eq!(settings.time_slot(), TimeSlot::TS2);

        // References resolve back to the restored graph's own entities.
        let contact = settings.tx_contact().get().unwrap();
        assert!(Rc::ptr_eq(&contact, &restored.contacts().get(0).unwrap()));
        assert_eq!(contact.borrow().digital_number(), Some(91));
        let grp = settings.group_list().get().unwrap();
        assert!(Rc::ptr_eq(&grp, &restored.group_lists().get(0).unwrap()));
        assert!(Rc::ptr_eq(&settings.radio_id().get().unwrap(), &id));
        let scan = ch.scan_list().get().unwrap();
        assert!(Rc::ptr_eq(&scan, &restored.scan_lists().get(0).unwrap()));
    }
    {
        let ch = analog.borrow();
        assert_eq!(ch.name(), "Simplex 2m");
        assert!(ch.vox().is_disabled());
        let settings = ch.analog_settings().unwrap();
        assert_eq!(settings.squelch().value(), Some(3));
        let aprs = settings.aprs().get().unwrap();
        assert!(Rc::ptr_eq(&aprs, &restored.positioning().get(0).unwrap()));
        assert_eq!(aprs.borrow().period(), 300);
    }

    let zone = restored.zones().get(0).unwrap();
    let members = zone.borrow().channels().targets();
    assert_eq!(members.len(), 2);
    assert!(Rc::ptr_eq(&members[0], &digital));
    assert!(Rc::ptr_eq(&members[1], &analog));

    let roam = restored.roaming().get(0).unwrap();
    let members = roam.borrow().channels().targets();
    assert_eq!(members.len(), 1);
    assert!(Rc::ptr_eq(&members[0], &digital));

    let grp = restored.group_lists().get(0).unwrap();
    assert_eq!(grp.borrow().contacts().len(), 2);
}

#[test]
fn serialization_is_stable_for_an_unmodified_graph() {
    let config = sample_config();
    assert_eq!(config.to_yaml().unwrap(), config.to_yaml().unwrap());
}

#[test]
fn round_trip_of_a_round_trip_is_identical() {
    let original = sample_config();
    let yaml = original.to_yaml().unwrap();
    let restored = Config::from_yaml(&yaml).unwrap();
    assert_eq!(restored.to_yaml().unwrap(), yaml);
}

#[test]
fn destroying_an_entity_invalidates_references_before_returning() {
    let config = sample_config();
    let digital = config.channels().get(0).unwrap();
    let scan = config.scan_lists().get(0).unwrap();
    assert!(digital.borrow().scan_list().is_set());

    // Removing the scan list clears the channel's reference synchronously.
    let scan_index = config.scan_lists().index_of(&scan).unwrap();
    config.scan_lists().remove(scan_index).unwrap();
    assert!(!digital.borrow().scan_list().is_set());

    // Removing the digital channel shrinks the zone and roaming memberships.
    config.channels().remove(0).unwrap();
    let zone = config.zones().get(0).unwrap();
    assert_eq!(zone.borrow().channels().len(), 1);
    let roam = config.roaming().get(0).unwrap();
    assert!(roam.borrow().channels().is_empty());
}

#[test]
fn find_operations_work_on_the_restored_graph() {
    let restored = Config::from_yaml(&sample_config().to_yaml().unwrap()).unwrap();

    let channels: &ChannelList = restored.channels();
    let found = channels.find_digital_channel(439.563, 431.963, TimeSlot::TS2, 1).unwrap();
    assert_eq!(found.borrow().name(), "TG91 Berlin");
    assert!(channels.find_digital_channel(439.563, 431.963, TimeSlot::TS1, 1).is_none());

    let found = channels.find_analog_channel_by_tx_freq(145.500).unwrap();
    assert_eq!(found.borrow().name(), "Simplex 2m");

    let contact = restored.contacts().find_digital_contact(8).unwrap();
    assert_eq!(contact.borrow().name(), "Regional");
}

#[test]
fn dangling_reference_id_fails_the_parse() {
    let yaml = "
channels:
  - digital:
      id: ch1
      name: Orphan
      rxFrequency: 439.563
      txFrequency: 431.963
      admit: Always
      colorCode: 1
      timeSlot: TS1
      contact: cont7
";
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Resolution { id, .. } if id == "cont7"));
}
