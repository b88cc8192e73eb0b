use super::*;
use crate::config::Config;
use crate::configset::ConfigSet;
use crate::io::NetworkDocument;
use crate::DnetError;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashSet};

const LINE: &str = include_str!("../../../networks/line.yaml");
const MESH: &str = include_str!("../../../networks/mesh.yaml");
const RADIAL: &str = include_str!("../../../networks/radial.yaml");

fn load(content: &str) -> Network {
    Network::new(NetworkDocument::from_yaml(content).unwrap()).unwrap()
}

fn load_err(content: &str) -> DnetError {
    Network::new(NetworkDocument::from_yaml(content).unwrap()).unwrap_err()
}

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-6 * b.abs().max(1.0), "{} != {}", a, b);
}

fn sec(network: &Network, name: &str) -> SectionIndex {
    network.section_index(name).unwrap()
}

#[test]
fn line_topology() {
    let network = load(LINE);
    assert_eq!(network.switches().len(), 2);
    assert_eq!(network.sections().len(), 5);
    assert_eq!(network.graph().edges, vec![(1, 2), (2, 3)]);
    assert_eq!(network.root_vertices(), &[1, 3]);
    assert_eq!(network.graph().vertex_count, 3);
    assert_eq!(network.switch_to_edge(1), (2, 3));
    assert_eq!(network.edge_to_switch((2, 1)), Some(0));
    assert_eq!(network.edge_to_switch((1, 3)), None);

    let r1 = sec(&network, "section_-001");
    let r2 = sec(&network, "section_-002");
    let a = sec(&network, "section_0001");
    assert_eq!(network.root_sections(), &[r1, r2]);
    assert_eq!(
        network.neighbors(Element::Section(a)),
        &[Element::Switch(0), Element::Section(r1)]
    );
    assert_eq!(
        network.neighbor_switches(Element::Section(r1)),
        BTreeSet::from([0])
    );
    assert_eq!(
        network.neighbor_switches(Element::Switch(0)),
        BTreeSet::from([1])
    );
    assert_eq!(network.border_switches(r1), BTreeSet::from([1]));
    assert_eq!(
        network.graph().vertex_sections(1),
        &[r1, a]
    );
}

#[test]
fn mesh_topology() {
    let network = load(MESH);
    assert_eq!(
        network.graph().edges,
        vec![(1, 2), (1, 3), (2, 3), (3, 4), (4, 5), (5, 6)]
    );
    assert_eq!(network.root_vertices(), &[1, 4, 6]);

    let r1 = sec(&network, "section_-001");
    let mut closed = Configuration::all_open(6);
    assert_eq!(
        network.surrounding_switches(r1, &closed),
        BTreeSet::from([0, 1])
    );
    closed.close(0);
    assert_eq!(
        network.surrounding_switches(r1, &closed),
        BTreeSet::from([1, 2])
    );
    assert_eq!(network.border_switches(r1), BTreeSet::from([3, 4, 5]));
}

#[test]
fn line_tree() {
    let network = load(LINE);
    let r1 = sec(&network, "section_-001");
    let a = sec(&network, "section_0001");
    let b = sec(&network, "section_0002");

    let open = Configuration::all_open(2);
    let branches = network.build_tree(r1, &open, &BTreeSet::new()).unwrap();
    assert_eq!(branches, vec![(r1, a)]);

    let closed = Configuration::from_closed(2, [0]);
    let branches = network.build_tree(r1, &closed, &BTreeSet::new()).unwrap();
    assert_eq!(branches, vec![(r1, a), (a, b)]);
    assert!(network.is_tree(&branches));

    let current = network.calc_current(r1, &branches);
    assert_eq!(current[&b][0].re, 20.0);
    assert_eq!(current[&a][1].re, 30.0);
    assert_eq!(current[&r1][2].re, 30.0);

    // 3 phases of 30^2 * 0.1 + 30^2 * 1 + 20^2 * 2
    let loss = network.calc_loss(r1, &closed, &BTreeSet::new(), false).unwrap();
    assert_close(loss, 3.0 * (90.0 + 900.0 + 800.0));
    let loss = network.calc_loss(r1, &closed, &BTreeSet::new(), true).unwrap();
    assert_close(loss, 3.0 * (900.0 + 800.0));
}

#[test]
fn barrier_stops_expansion() {
    let network = load(MESH);
    let r1 = sec(&network, "section_-001");
    let a = sec(&network, "section_0001");
    let b = sec(&network, "section_0002");
    let c = sec(&network, "section_0003");
    let closed = Configuration::from_closed(6, [0, 1]);
    let barrier = BTreeSet::from([Element::Section(r1), Element::Section(b)]);
    let branches = network.build_tree(a, &closed, &barrier).unwrap();
    assert_eq!(branches, vec![(a, c)]);
}

#[test]
fn loops_are_detected() {
    let network = load(MESH);
    let r1 = sec(&network, "section_-001");
    // Switches 1, 2 and 3 close the loop around the first substation.
    let closed = Configuration::from_closed(6, [0, 1, 2]);
    let branches = network.build_tree(r1, &closed, &BTreeSet::new()).unwrap();
    assert!(!network.is_tree(&branches));
    assert!(!network.satisfies_electric_constraints(r1, &closed).unwrap());
    assert_eq!(
        network.calc_loss(r1, &closed, &BTreeSet::new(), false),
        Err(DnetError::Structural("loop found".to_string()))
    );
}

#[test]
fn is_tree_test() {
    let network = load(MESH);
    assert!(network.is_tree(&[]));
    assert!(network.is_tree(&[(0, 3), (0, 4), (3, 5)]));
    assert!(!network.is_tree(&[(0, 3), (3, 5), (5, 0)]));
    // Disconnected
    assert!(!network.is_tree(&[(0, 3), (5, 6)]));
}

#[test]
fn current_limit() {
    let doc = NetworkDocument::from_yaml(LINE).unwrap();
    let config = Config {
        max_current: 40.0,
        ..Config::default()
    };
    let network = Network::with_config(doc, config).unwrap();
    let r2 = sec(&network, "section_-002");
    // Section 0002 moves to the second substation: 50 A.
    let closed = Configuration::from_closed(2, [1]);
    assert!(!network.satisfies_electric_constraints(r2, &closed).unwrap());

    let configs = network.enumerate().unwrap();
    assert_eq!(configs.len(), 1);
    assert!(configs.contains(&Configuration::from_closed(2, [0])));
}

#[test]
fn voltage_limit() {
    let doc = NetworkDocument::from_yaml(LINE).unwrap();
    let mut config = Config::default();
    // Leaf section 0002 fed by the second substation drops 20 + 100 + 5 volts.
    config.voltage_range.0 = config.sending_voltage - 110.0;
    let network = Network::with_config(doc, config).unwrap();
    let r1 = sec(&network, "section_-001");
    let r2 = sec(&network, "section_-002");
    assert!(network
        .satisfies_electric_constraints(r1, &Configuration::from_closed(2, [0]))
        .unwrap());
    assert!(!network
        .satisfies_electric_constraints(r2, &Configuration::from_closed(2, [1]))
        .unwrap());
}

#[test]
fn line_enumeration() {
    let network = load(LINE);
    let configs = network.enumerate().unwrap();
    assert_eq!(configs.len(), 2);
    assert!(configs.contains(&Configuration::from_closed(2, [0])));
    assert!(configs.contains(&Configuration::from_closed(2, [1])));
    assert!(!configs.contains(&Configuration::all_open(2)));
    assert!(!configs.contains(&Configuration::from_closed(2, [0, 1])));
}

#[test]
fn mesh_enumeration() {
    let network = load(MESH);
    let configs = network.enumerate().unwrap();
    assert_eq!(configs.len(), 10);
    assert_eq!(network.enumerate_topologies().len(), 10);

    for config in configs.iter() {
        for &root in network.root_sections() {
            let branches = network.build_tree(root, &config, &BTreeSet::new()).unwrap();
            assert!(network.is_tree(&branches));
            assert!(network.satisfies_electric_constraints(root, &config).unwrap());
        }
    }

    // Intersection order does not matter.
    let roots = network.root_sections();
    let forward = roots
        .iter()
        .try_fold(network.enumerate_forests(), |f, &r| {
            network.enumerate_trees(r).map(|t| f.intersection(&t))
        })
        .unwrap();
    let backward = roots
        .iter()
        .rev()
        .try_fold(network.enumerate_forests(), |f, &r| {
            network.enumerate_trees(r).map(|t| f.intersection(&t))
        })
        .unwrap();
    assert_eq!(forward.count(), 10);
    assert!(forward.difference(&backward).is_empty());
    assert!(backward.difference(&forward).is_empty());
    assert_eq!(ConfigSet::new(&network, forward), configs);
}

fn with_limits(max_current: f64, max_drop: Option<f64>) -> Network {
    let mut config = Config {
        max_current,
        ..Config::default()
    };
    if let Some(drop) = max_drop {
        config.voltage_range.0 = config.sending_voltage - drop;
    }
    Network::with_config(NetworkDocument::from_yaml(MESH).unwrap(), config).unwrap()
}

#[test]
fn mesh_enumeration_with_limits() {
    let cases = [
        (300.0, None, 10),
        (80.0, None, 9),
        (60.0, None, 1),
        (300.0, Some(40.0), 4),
        (80.0, Some(25.0), 4),
        (80.0, Some(15.0), 0),
        (50.0, None, 0),
    ];
    for (max_current, max_drop, expected) in cases {
        let network = with_limits(max_current, max_drop);
        let configs = network.enumerate().unwrap();
        let topologies = network.enumerate_topologies();
        assert_eq!(topologies.len(), 10);

        let feasible: Vec<Configuration> = topologies
            .iter()
            .filter(|c| {
                network
                    .root_sections()
                    .iter()
                    .all(|&r| network.satisfies_electric_constraints(r, c).unwrap())
            })
            .collect();
        assert_eq!(configs.len(), expected, "{} A, {:?} V", max_current, max_drop);
        assert_eq!(feasible.len() as u128, configs.len());
        for config in &feasible {
            assert!(configs.contains(config));
        }
        assert!(configs.is_subset(&topologies));
    }
}

#[test]
fn mesh_components() {
    let network = load(MESH);
    let components = network.find_components().unwrap();
    assert_eq!(components.len(), 2);
    assert_eq!(components[0].switches, BTreeSet::from([0, 1, 2, 3]));
    assert_eq!(components[1].switches, BTreeSet::from([4, 5]));
    let names = |c: &Component| -> Vec<&str> {
        c.sections
            .iter()
            .map(|&s| network.section(s).name.as_str())
            .collect()
    };
    assert_eq!(
        names(&components[0]),
        vec![
            "section_0001",
            "section_0002",
            "section_0003",
            "section_0004",
            "section_0005",
            "section_0006",
            "section_0007"
        ]
    );
    assert_eq!(
        names(&components[1]),
        vec!["section_0008", "section_0010", "section_0011"]
    );
}

#[test]
fn unordered_components() {
    let mut doc = NetworkDocument::from_yaml(MESH).unwrap();
    doc.switches.swap(0, 4);
    let network = Network::new(doc).unwrap();
    assert!(matches!(
        network.find_components(),
        Err(DnetError::Structural(_))
    ));
    let configs = network.enumerate().unwrap();
    assert_eq!(configs.len(), 10);
    assert!(matches!(
        network.optimize(&configs),
        Err(DnetError::Structural(_))
    ));
}

#[test]
fn line_optimization() {
    let network = load(LINE);
    let configs = network.enumerate().unwrap();
    let result = network.optimize(&configs).unwrap();
    assert_eq!(result.open_switches, vec!["switch_0002"]);
    assert_eq!(result.closed_switches, vec!["switch_0001"]);
    assert_close(result.minimum_loss, 11040.0);
    assert_close(result.loss_without_root_sections, 10500.0);
    assert_close(result.lower_bound_of_minimum_loss, 11040.0);
    assert_close(result.search_loss, 10500.0);

    let best = network.configuration(&["switch_0001"]).unwrap();
    let (loss, lower_bound) = network.loss_report(&best).unwrap();
    assert_close(loss, 11040.0);
    assert_close(lower_bound, 11040.0);
    let other = network.configuration(&["switch_0002"]).unwrap();
    assert_close(network.loss(&other).unwrap(), 18480.0);
}

#[test]
fn optimization_result_json() {
    let network = load(LINE);
    let configs = network.enumerate().unwrap();
    let result = network.optimize(&configs).unwrap();
    let json: serde_json::Value = serde_json::to_value(&result).unwrap();
    assert_eq!(json["open_switches"], serde_json::json!(["switch_0002"]));
    assert_eq!(json["closed_switches"], serde_json::json!(["switch_0001"]));
    let loss = json["minimum_loss"].as_f64().unwrap();
    assert_close(loss, 11040.0);
    assert!(json.get("lower_bound_of_minimum_loss").is_some());
}

#[test]
fn mesh_optimization() {
    let network = load(MESH);
    let configs = network.enumerate().unwrap();
    let result = network.optimize(&configs).unwrap();
    assert_eq!(
        result.closed_switches,
        vec!["switch_0001", "switch_0002", "switch_0005"]
    );
    assert_eq!(
        result.open_switches,
        vec!["switch_0003", "switch_0004", "switch_0006"]
    );
    assert_close(result.minimum_loss, 6838.225);
    assert_close(result.loss_without_root_sections, 4535.25);
    assert_close(result.lower_bound_of_minimum_loss, 2015.5 + 4535.25);
    assert_close(result.search_loss, result.loss_without_root_sections);

    // The search minimizes the loss outside the substation sections.
    let root_bound = network.root_loss_lower_bound().unwrap();
    let best_without_roots = configs
        .iter()
        .map(|c| network.loss_report(&c).unwrap().1 - root_bound)
        .fold(f64::INFINITY, f64::min);
    assert_close(result.loss_without_root_sections, best_without_roots);

    for config in configs.iter() {
        let loss = network.loss(&config).unwrap();
        assert!(loss >= 0.0);
        assert_eq!(loss, network.loss(&config).unwrap());
    }

    let again = network.optimize(&configs).unwrap();
    assert_eq!(again, result);
}

#[test]
fn optimize_subfamily() {
    let network = load(MESH);
    let configs = network.enumerate().unwrap();
    let switch_0002_open = configs.excluding("switch_0002").unwrap();
    assert_eq!(switch_0002_open.len(), 6);
    let result = network.optimize(&switch_0002_open).unwrap();
    assert_eq!(
        result.closed_switches,
        vec!["switch_0001", "switch_0004", "switch_0005"]
    );
    assert_close(result.minimum_loss, 6850.575);

    let diagram = Diagram::parse(&switch_0002_open.dumps(), 6).unwrap();
    assert_eq!(network.optimize_diagram(&diagram).unwrap(), result);
}

#[test]
fn optimize_diagram_without_successor() {
    let network = load(LINE);
    let result = Diagram::parse("2 2 B B\n3 1 B 2\n.\n", 2)
        .and_then(|diagram| network.optimize_diagram(&diagram));
    assert!(matches!(result, Err(DnetError::Structural(_))));
}

#[test]
fn optimize_empty_family() {
    let network = load(LINE);
    let configs = network.enumerate().unwrap().excluding("switch_0001").unwrap();
    let none = configs.excluding("switch_0002").unwrap();
    assert!(none.is_empty());
    assert!(matches!(
        network.optimize(&none),
        Err(DnetError::BadInput(_))
    ));
}

#[test]
fn zero_switches() {
    let network = load(RADIAL);
    assert_eq!(network.graph().edges.len(), 0);
    assert_eq!(network.root_vertices(), &[1]);
    let configs = network.enumerate().unwrap();
    assert_eq!(configs.len(), 1);
    let result = network.optimize(&configs).unwrap();
    assert!(result.open_switches.is_empty());
    assert!(result.closed_switches.is_empty());
    let direct = network.loss(&Configuration::all_open(0)).unwrap();
    assert_close(result.minimum_loss, direct);
    assert_close(direct, 2999.7);
    assert_close(result.search_loss, result.loss_without_root_sections);
}

#[test]
fn config_set_operations() {
    let network = load(MESH);
    let configs = network.enumerate().unwrap();
    let with5 = configs.including("switch_0005").unwrap();
    let without5 = configs.excluding("switch_0005").unwrap();
    assert_eq!(with5.len(), 5);
    assert_eq!(without5.len(), 5);
    assert!(with5.is_disjoint(&without5));
    assert_eq!(with5.union(&without5), configs);
    assert!(with5.is_subset(&configs));
    assert!(configs.is_superset(&without5));
    assert!(!configs.is_subset(&with5));
    assert!(with5.intersection(&without5).is_empty());
    assert_eq!(configs.difference(&with5), without5);

    let with1 = configs.including("switch_0001").unwrap();
    let sym = with5.symmetric_difference(&with1);
    assert_eq!(
        sym.len(),
        with5.len() + with1.len() - 2 * with5.intersection(&with1).len()
    );

    assert!(matches!(
        configs.including("switch_9999"),
        Err(DnetError::BadInput(_))
    ));

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..10 {
        let config = configs.choice(&mut rng).unwrap();
        assert!(configs.contains(&config));
    }
    assert_eq!(configs.iter().count(), 10);
    assert!(!configs.contains(&Configuration::all_open(3)));
}

#[test]
fn config_set_sizes() {
    let network = load(MESH);
    let configs = network.enumerate().unwrap();
    let by_size: Vec<u128> = (0..=6).map(|k| configs.sized(k).len()).collect();
    assert_eq!(by_size.iter().sum::<u128>(), configs.len());
    for (k, &count) in by_size.iter().enumerate() {
        let direct = configs.iter().filter(|c| c.closed_count() == k).count();
        assert_eq!(count, direct as u128);
    }
    assert_eq!(
        configs.smaller(3).len() + configs.sized(3).len() + configs.larger(3).len(),
        configs.len()
    );
    assert!(configs.smaller(0).is_empty());
    assert!(configs.larger(6).is_empty());
    for config in configs.larger(2).iter() {
        assert!(config.closed_count() > 2);
    }
}

#[test]
fn config_set_rand_iter() {
    let network = load(MESH);
    let configs = network.enumerate().unwrap();
    let drawn: Vec<Configuration> = configs.rand_iter(StdRng::seed_from_u64(11)).collect();
    assert_eq!(drawn.len(), 10);
    let distinct: HashSet<Configuration> = drawn.iter().cloned().collect();
    assert_eq!(distinct.len(), 10);
    assert!(drawn.iter().all(|c| configs.contains(c)));

    let filtered = configs.including("switch_0002").unwrap();
    let five: Vec<Configuration> = filtered.rand_iter(StdRng::seed_from_u64(5)).take(5).collect();
    assert_eq!(five.len() as u128, filtered.len().min(5));
    let average = five.iter().map(|c| network.loss(c).unwrap()).sum::<f64>() / five.len() as f64;
    assert!(average > 0.0);
}

#[test]
fn config_set_weighted_iteration() {
    let network = load(MESH);
    let configs = network.enumerate().unwrap();

    // Unit weights: fewest closed switches first.
    let ascending: Vec<(f64, Configuration)> = configs.min_iter(&BTreeMap::new()).unwrap().collect();
    assert_eq!(ascending.len(), 10);
    for pair in ascending.windows(2) {
        assert!(pair[0].0 <= pair[1].0);
    }
    for (w, config) in &ascending {
        assert_eq!(*w, config.closed_count() as f64);
    }

    let weights = BTreeMap::from([
        ("switch_0001".to_string(), 10.0),
        ("switch_0005".to_string(), -4.0),
    ]);
    let descending: Vec<(f64, Configuration)> = configs.max_iter(&weights).unwrap().collect();
    assert_eq!(descending.len(), 10);
    for pair in descending.windows(2) {
        assert!(pair[0].0 >= pair[1].0);
    }
    assert_eq!(descending[0].0, 12.0);
    assert_eq!(descending[9].0, -2.0);
    let first = &descending[0].1;
    assert!(first.is_closed(0));
    assert!(!first.is_closed(4));

    let unknown = BTreeMap::from([("switch_9999".to_string(), 1.0)]);
    assert!(matches!(configs.min_iter(&unknown), Err(DnetError::BadInput(_))));
}

#[test]
#[should_panic]
fn config_sets_of_different_networks() {
    let line = load(LINE);
    let mesh = load(MESH);
    let a = ConfigSet::all_open(&line);
    let b = ConfigSet::all_open(&mesh);
    let _ = a.union(&b);
}

const BAD_BASE: &str = r#"
switches: [switch_0001]
sections:
  section_-001: {load: [0, 0, 0, 0, 0, 0], impedance: [0.1, 0, 0.1, 0, 0.1, 0], substation: true}
  section_-002: {load: [0, 0, 0, 0, 0, 0], impedance: [0.1, 0, 0.1, 0, 0.1, 0], substation: true}
  section_0001: {load: [1, 0, 1, 0, 1, 0], impedance: [1, 0, 1, 0, 1, 0]}
  section_0002: {load: [1, 0, 1, 0, 1, 0], impedance: [1, 0, 1, 0, 1, 0]}
"#;

fn with_nodes(nodes: &str) -> String {
    format!("nodes: {}\n{}", nodes, BAD_BASE)
}

#[test]
fn valid_base() {
    let network = load(&with_nodes(
        "[[section_-001, section_0001], [section_0001, switch_0001], [switch_0001, section_0002], [section_0002, section_-002]]",
    ));
    assert_eq!(network.graph().edges, vec![(1, 2)]);
}

#[test]
fn undeclared_identifier() {
    let err = load_err(&with_nodes("[[section_-001, section_0009]]"));
    assert!(matches!(err, DnetError::BadInput(_)));
}

#[test]
fn duplicate_switch() {
    let mut doc = NetworkDocument::from_yaml(LINE).unwrap();
    doc.switches.push("switch_0001".to_string());
    assert!(matches!(Network::new(doc), Err(DnetError::BadInput(_))));
}

#[test]
fn substation_next_to_switch() {
    let err = load_err(&with_nodes(
        "[[section_-001, switch_0001], [switch_0001, section_0001], [section_0001, section_0002, section_-002]]",
    ));
    assert!(matches!(err, DnetError::Structural(_)));
}

#[test]
fn switch_inside_region() {
    let err = load_err(&with_nodes(
        "[[section_-001, section_0001], [section_0001, switch_0001], [switch_0001, section_0002], [section_0001, section_0002, section_-002]]",
    ));
    assert!(matches!(err, DnetError::Structural(_)));
}

#[test]
fn substations_in_one_region() {
    let err = load_err(&with_nodes(
        "[[section_-001, section_0001, section_-002], [section_0001, switch_0001], [switch_0001, section_0002]]",
    ));
    assert!(matches!(err, DnetError::Structural(_)));
}

#[test]
fn switch_next_to_switch() {
    let mut doc = NetworkDocument::from_yaml(LINE).unwrap();
    doc.nodes.push(vec!["switch_0001".to_string(), "switch_0002".to_string()]);
    assert!(matches!(Network::new(doc), Err(DnetError::Structural(_))));
}

#[test]
fn parallel_switches() {
    let mut doc = NetworkDocument::from_yaml(LINE).unwrap();
    doc.switches.push("switch_0003".to_string());
    doc.nodes.push(vec!["section_0001".to_string(), "switch_0003".to_string()]);
    doc.nodes.push(vec!["switch_0003".to_string(), "section_0002".to_string()]);
    assert!(matches!(Network::new(doc), Err(DnetError::Structural(_))));
}
