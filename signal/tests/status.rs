use quectel_signal::{
    CarrierLayout, CarrierRole, CellState, NeighbourScope, Rat, RawResponses,
    SignalQuality, StatusSnapshot, beep_count,
    parser::{
        parse_band_preferences, parse_carriers, parse_cell_lock,
        parse_device_info, parse_neighbour_cells, parse_operator,
        parse_serving_cell,
    },
};

const ATI: &str = "ATI\r\nQuectel\r\nRM520N-GL\r\n\
    Revision: RM520NGLAAR03A07M4G\r\n\r\nOK\r\n";
const QSPN: &str = "+QSPN: \"I TIM\",\"TIM\",\"\",0,\"22201\"\r\n\r\nOK\r\n";
const SERVINGCELL: &str = "+QENG: \"servingcell\",\"NOCONN\"\r\n\
    +QENG: \"LTE\",\"FDD\",222,01,328261F,280,275,1,4,5,BE3,\
    -99,-14,-66,7,4,30,-\r\n\
    +QENG: \"NR5G-NSA\",222,01,920,-96,18,-10,648768,78,12,1\r\n\
    \r\nOK\r\n";
const QCAINFO: &str = "\
    +QCAINFO: \"PCC\",275,100,\"LTE BAND 1\",1,280,-99,-14,-67,-4\r\n\
    +QCAINFO: \"SCC\",1350,100,\"LTE BAND 3\",1,240,-95,-18,-68,-10,0,-,-\r\n\
    +QCAINFO: \"SCC\",648768,12,\"NR5G BAND 78\",920\r\n\
    \r\nOK\r\n";
const NEIGHBOURCELL: &str = "\
    +QENG: \"neighbourcell intra\",\"LTE\",275,280,-14,-99,-67,-,-,-,-,-,-\r\n\
    +QENG: \"neighbourcell inter\",\"LTE\",1350,240,-18,-95,-68,-,-,-,-,-\r\n\
    \r\nOK\r\n";

fn full_poll() -> RawResponses {
    RawResponses {
        ati: Some(ATI.into()),
        qspn: Some(QSPN.into()),
        servingcell: Some(SERVINGCELL.into()),
        qcainfo: Some(QCAINFO.into()),
        neighbourcell: Some(NEIGHBOURCELL.into()),
    }
}

#[test]
fn full_nsa_poll() {
    let snapshot = StatusSnapshot::from_responses(&full_poll());

    let device = snapshot.device.as_ref().unwrap();
    assert_eq!(device.model, "RM520N-GL");
    assert_eq!(snapshot.operator.as_ref().unwrap().mcc(), Some("222"));

    let lte = snapshot.lte().unwrap();
    assert_eq!(lte.enodeb_id(), Some(206_886));
    assert_eq!(lte.dl_bandwidth_mhz, Some(20.0));
    assert!((lte.freq_mhz.unwrap() - 2137.5).abs() < 1e-6);

    let nr = snapshot.nr().unwrap();
    assert_eq!(nr.band, Some(78));
    assert_eq!(nr.bandwidth_mhz, Some(100.0));
    assert!((nr.freq_mhz.unwrap() - 3731.52).abs() < 1e-6);
    assert_eq!(nr.quality(), Some(SignalQuality::Good));

    assert_eq!(snapshot.carriers.len(), 3);

    // PCC matches the LTE serving cell: own RSRP kept, SINR from the serving
    // cell, RSSNR untouched.
    let pcc = &snapshot.carriers[0];
    assert_eq!(pcc.role, CarrierRole::Primary);
    assert_eq!(pcc.state, Some(CellState::Registered));
    assert_eq!(pcc.signal.rsrp, Some(-99));
    assert_eq!(pcc.signal.sinr, Some(7.0));
    assert_eq!(pcc.signal.rssnr, Some(-4.0));
    assert_eq!(pcc.bandwidth_mhz, Some(20.0));

    // LTE SCC on another cell: nothing to borrow.
    let scc = &snapshot.carriers[1];
    assert_eq!(scc.layout, CarrierLayout::SignalThenUplink);
    assert_eq!(scc.signal.sinr, None);
    assert_eq!(scc.signal.rssnr, Some(-10.0));
    assert_eq!(scc.band, Some(3));

    // NR SCC reports only its PCI and borrows everything from the NR cell.
    let nr_scc = &snapshot.carriers[2];
    assert_eq!(nr_scc.rat, Rat::Nr5g);
    assert_eq!(nr_scc.signal.rsrp, Some(-96));
    assert_eq!(nr_scc.signal.rsrq, Some(-10));
    assert_eq!(nr_scc.signal.sinr, Some(18.0));
    assert_eq!(nr_scc.signal.rssnr, None);
    assert_eq!(nr_scc.bandwidth_mhz, Some(100.0));

    assert_eq!(snapshot.neighbours.len(), 2);
    assert_eq!(snapshot.neighbours[1].scope, NeighbourScope::Inter);
    assert!(snapshot.neighbours[1].freq_mhz.is_some());

    assert_eq!(snapshot.beep_count(), 5);
}

#[test]
fn secondary_ten_field_line_has_rsrp_and_no_sinr() {
    let carriers = parse_carriers(
        "+QCAINFO: \"SCC\",275,75,\"LTE BAND 1\",1,280,-99,-14,-67,-4\r\n\
         OK\r\n",
    );
    assert_eq!(carriers.len(), 1);
    assert_eq!(carriers[0].role, CarrierRole::Secondary);
    assert_eq!(carriers[0].signal.rsrp, Some(-99));
    assert_eq!(carriers[0].signal.sinr, None);
}

#[test]
fn serving_sinr_backfills_carrier_with_same_pci() {
    let raw = RawResponses {
        servingcell: Some(
            "+QENG: \"servingcell\",\"NOCONN\",\"LTE\",\"FDD\",222,01,\
             328261F,275,1850,3,5,5,BE3,-99,-14,-66,7\r\nOK\r\n"
                .into(),
        ),
        qcainfo: Some(
            "+QCAINFO: \"PCC\",275,100,\"LTE BAND 1\",1,275,-99,-14,-67,-4\r\n\
             OK\r\n"
                .into(),
        ),
        ..Default::default()
    };
    let snapshot = StatusSnapshot::from_responses(&raw);
    let carrier = &snapshot.carriers[0];

    assert_eq!(carrier.pci, Some(275));
    assert_eq!(carrier.signal.sinr, Some(7.0));
    assert_eq!(carrier.signal.rssnr, Some(-4.0));
}

#[test]
fn terminator_alone_is_empty_everywhere() {
    for resp in ["OK", "OK\r\n", "\r\nERROR\r\n"] {
        assert_eq!(parse_device_info(resp), None);
        assert_eq!(parse_operator(resp), None);
        assert_eq!(parse_serving_cell(resp), None);
        assert!(parse_carriers(resp).is_empty());
        assert!(parse_neighbour_cells(resp).is_empty());
        assert!(parse_band_preferences(resp).is_empty());
        assert_eq!(parse_cell_lock(resp), None);
    }

    let snapshot = StatusSnapshot::from_responses(&RawResponses {
        ati: Some("OK".into()),
        qspn: Some("OK".into()),
        servingcell: Some("OK".into()),
        qcainfo: Some("OK".into()),
        neighbourcell: Some("OK".into()),
    });
    assert!(snapshot.is_empty());
}

#[test]
fn beep_count_never_decreases() {
    let samples = [-5.0, 0.0, 12.0, 14.0, 16.0, 17.0, 18.0, 19.0, 25.0];
    let counts: Vec<u8> =
        samples.iter().map(|s| beep_count(Some(*s))).collect();
    assert!(counts.windows(2).all(|w| w[0] <= w[1]), "{counts:?}");
    assert_eq!(counts.first(), Some(&0));
    assert_eq!(counts.last(), Some(&6));
}

#[test]
fn snapshot_json_keeps_sinr_and_rssnr_apart() {
    let snapshot = StatusSnapshot::from_responses(&full_poll());
    let json = serde_json::to_value(&snapshot).unwrap();

    let scc = &json["carriers"][1]["signal"];
    assert_eq!(scc["rssnr"], -10.0);
    assert!(scc["sinr"].is_null());
    assert_eq!(json["carriers"][0]["role"], "primary");
    assert_eq!(json["serving"]["nr"]["band"], 78);

    let back: StatusSnapshot = serde_json::from_value(json).unwrap();
    assert_eq!(back.carriers.len(), snapshot.carriers.len());
    assert_eq!(back.carriers[1].layout, CarrierLayout::SignalThenUplink);
}
