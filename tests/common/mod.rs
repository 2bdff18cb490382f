use rand::rngs::StdRng;
use rosco_lib::{Credit,Flit,Time};
use rosco_lib::config::Configuration;
use rosco_lib::topology::Topology;

///Build a configuration from literal entries, as a driver would after
///reading its file.
pub fn build_configuration(entries:&[(&str,&str)]) -> Configuration
{
    let mut config = Configuration::new();
    for (key,value) in entries
    {
        config.set(key,value);
    }
    config
}

///See the construction traces with RUST_LOG=debug.
#[allow(dead_code)]
pub fn init_logging()
{
    let _ = env_logger::builder().is_test(true).try_init();
}

///Inject a flit at its source at cycle 0, advance the topology until it
///ejects at its destination, and return the arrival cycle. The driver side
///of the ejection is modelled faithfully: the consumed buffer slot is
///credited back to the ejecting router.
#[allow(dead_code)]
pub fn deliver(topology:&dyn Topology, flit:Flit, max_cycles:Time, rng:&mut StdRng) -> Option<(Time,Flit)>
{
    let source = flit.source;
    let destination = flit.destination;
    topology.injection_channel(source).flit.borrow_mut().send(flit,0);
    let eject = topology.ejection_channel(destination);
    for cycle in 1..=max_cycles
    {
        topology.advance(cycle,rng);
        if let Some(flit) = eject.flit.borrow_mut().receive(cycle)
        {
            eject.credit.borrow_mut().send(Credit{class:flit.class},cycle);
            return Some((cycle,flit));
        }
    }
    None
}
