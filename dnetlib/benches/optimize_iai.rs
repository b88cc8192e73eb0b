use dnetlib::io::NetworkDocument;
use dnetlib::network::Network;
use iai_callgrind::{black_box, library_benchmark, library_benchmark_group, main};

const LINE: &str = include_str!("../../networks/line.yaml");
const MESH: &str = include_str!("../../networks/mesh.yaml");

// Same fixtures as the network tests.

fn setup(yaml: &str) -> Network {
    Network::new(NetworkDocument::from_yaml(yaml).unwrap()).unwrap()
}

#[library_benchmark]
#[bench::line(setup(LINE))]
#[bench::mesh(setup(MESH))]
fn enumerate(network: Network) {
    let configs = network.enumerate().unwrap();
    black_box(configs.len());
}

#[library_benchmark]
#[bench::line(setup(LINE))]
#[bench::mesh(setup(MESH))]
fn enumerate_and_optimize(network: Network) {
    let configs = network.enumerate().unwrap();
    let result = network.optimize(&configs).unwrap();
    black_box(result);
}

library_benchmark_group!(
    name = optimize_group;
    benchmarks = enumerate, enumerate_and_optimize
);

main!(library_benchmark_groups = optimize_group);
