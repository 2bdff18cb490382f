mod common;

use common::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rosco_lib::Flit;
use rosco_lib::router::Router;
use rosco_lib::topology::{Topology,TopologyBuilderArgument,new_topology};
use rosco_lib::topology::unitorus::UniTorus;

#[test]
fn scenario_4x6x8()
{
    init_logging();
    let config = build_configuration(&[("topology","unitorus"),("dim_sizes","{4,6,8}")]);
    let mut rng = StdRng::seed_from_u64(1);
    let topology = new_topology(TopologyBuilderArgument{config:&config,rng:&mut rng});
    assert_eq!( topology.num_nodes(), 192 );
    //One channel per node per dimension.
    assert_eq!( topology.num_channels(), 576 );
    assert_eq!( topology.num_channels()/topology.num_nodes(), 3 );
    //No latency overrides: every channel, and its credit return, defaults to 1.
    for index in 0..topology.num_channels()
    {
        let pair = topology.resources().channel(index);
        assert_eq!( pair.flit.borrow().latency(), 1 );
        assert_eq!( pair.credit.borrow().latency(), 1 );
    }
    for node in 0..topology.num_nodes()
    {
        assert_eq!( topology.injection_channel(node).flit.borrow().latency(), 1 );
        assert_eq!( topology.ejection_channel(node).flit.borrow().latency(), 1 );
    }
}

#[test]
fn every_router_has_the_declared_degree()
{
    let config = build_configuration(&[("topology","unitorus"),("dim_sizes","{4,6,8}")]);
    let mut rng = StdRng::seed_from_u64(1);
    let topology = new_topology(TopologyBuilderArgument{config:&config,rng:&mut rng});
    for node in 0..topology.num_nodes()
    {
        let router = topology.router(node);
        let router = router.borrow();
        //Three dimensions plus injection/ejection, fully bound.
        assert_eq!( router.core().input_index_count(), 4 );
        assert_eq!( router.core().output_index_count(), 4 );
    }
}

#[test]
fn a_flit_crosses_the_torus_in_dimension_order()
{
    let config = build_configuration(&[("topology","unitorus"),("dim_sizes","{4,4}")]);
    let mut rng = StdRng::seed_from_u64(1);
    let topology = UniTorus::new(TopologyBuilderArgument{config:&config,rng:&mut rng});
    let destination = topology.coords_to_node(&[2,2]);
    let delivered = deliver(&topology,Flit::new(42,0,destination,0),32,&mut rng);
    let (arrival,flit) = delivered.expect("the flit should have been delivered");
    assert_eq!( flit.id, 42 );
    //Injection (1) + two X+ hops + two Y+ hops + ejection (1), all latency 1.
    assert_eq!( arrival, 6 );
}

#[test]
fn per_dimension_latency_slows_the_path()
{
    let config = build_configuration(&[("topology","unitorus"),("dim_sizes","{4}"),("dim_latency","{3}")]);
    let mut rng = StdRng::seed_from_u64(1);
    let topology = UniTorus::new(TopologyBuilderArgument{config:&config,rng:&mut rng});
    let delivered = deliver(&topology,Flit::new(7,0,2,0),32,&mut rng);
    let (arrival,_) = delivered.expect("the flit should have been delivered");
    //Injection (1) + two hops of latency 3 + ejection (1).
    assert_eq!( arrival, 8 );
}

#[test]
fn credits_drain_back_after_delivery()
{
    let config = build_configuration(&[("topology","unitorus"),("dim_sizes","{4}"),("dim_latency","{3}")]);
    let mut rng = StdRng::seed_from_u64(1);
    let topology = UniTorus::new(TopologyBuilderArgument{config:&config,rng:&mut rng});
    let (arrival,_) = deliver(&topology,Flit::new(7,0,2,0),32,&mut rng).expect("the flit should have been delivered");
    //Give the credits time to travel back upstream, then nothing is owed.
    for cycle in arrival+1..=arrival+10
    {
        topology.advance(cycle,&mut rng);
    }
    for node in 0..topology.num_nodes()
    {
        let router = topology.router(node);
        let used = router.borrow().used_credits();
        assert!( used.iter().all(|&value|value==0), "router {} still owes credits: {:?}",node,used );
    }
}

#[test]
fn wrapping_forward_links_reach_every_node()
{
    //From the last coordinate the forward link wraps to zero.
    let config = build_configuration(&[("topology","unitorus"),("dim_sizes","{4}")]);
    let mut rng = StdRng::seed_from_u64(1);
    let topology = UniTorus::new(TopologyBuilderArgument{config:&config,rng:&mut rng});
    let delivered = deliver(&topology,Flit::new(9,3,1,0),32,&mut rng);
    let (arrival,_) = delivered.expect("the flit should have been delivered");
    //3 -> 0 -> 1: two hops plus injection and ejection.
    assert_eq!( arrival, 4 );
}

#[test]
#[should_panic(expected="Unknown topology")]
fn unknown_topology_is_fatal()
{
    let config = build_configuration(&[("topology","hexagon"),("dim_sizes","{4}")]);
    let mut rng = StdRng::seed_from_u64(1);
    new_topology(TopologyBuilderArgument{config:&config,rng:&mut rng});
}

#[test]
#[should_panic(expected="dim_latency has 1 values but topology has 2 dimensions")]
fn mismatched_latency_list_is_fatal()
{
    let config = build_configuration(&[("topology","unitorus"),("dim_sizes","{4,4}"),("dim_latency","{3}")]);
    let mut rng = StdRng::seed_from_u64(1);
    new_topology(TopologyBuilderArgument{config:&config,rng:&mut rng});
}
