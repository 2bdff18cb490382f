mod common;

use common::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rosco_lib::Flit;
use rosco_lib::router::Router;
use rosco_lib::topology::{Topology,TopologyBuilderArgument,new_topology};
use rosco_lib::topology::cake::Cake;

fn two_by_two_by_two(mapping:Option<&str>) -> Vec<(&str,&str)>
{
    let mut entries = vec![
        ("topology","cake"),
        ("dim_sizes","{2,2,2}"),
        ("elevator_coords","{{0,0}}"),
    ];
    if let Some(mapping) = mapping
    {
        entries.push(("elevator_mapping_coords",mapping));
    }
    entries
}

#[test]
fn scenario_2x2x2_with_one_elevator()
{
    init_logging();
    let config = build_configuration(&two_by_two_by_two(None));
    let mut rng = StdRng::seed_from_u64(1);
    let topology = Cake::new(TopologyBuilderArgument{config:&config,rng:&mut rng});
    assert_eq!( topology.num_nodes(), 8 );
    assert_eq!( topology.num_inplane_channels(), 16 );
    assert_eq!( topology.num_vertical_channels(), 4 );
    assert_eq!( topology.num_channels(), 20 );
}

#[test]
fn only_elevator_nodes_carry_vertical_ports()
{
    let config = build_configuration(&two_by_two_by_two(None));
    let mut rng = StdRng::seed_from_u64(1);
    let topology = Cake::new(TopologyBuilderArgument{config:&config,rng:&mut rng});
    for id in 0..topology.num_nodes()
    {
        let (x,y,_z) = topology.id_to_xyz(id);
        let router = topology.router(id);
        let router = router.borrow();
        let outputs = router.core().output_index_count();
        if topology.is_elevator(x,y)
        {
            //Four network outputs plus ejection, on every layer.
            assert_eq!( outputs, 5, "node {} should host an elevator",id );
        }
        else
        {
            assert_eq!( outputs, 3, "node {} should not host an elevator",id );
        }
        assert_eq!( router.core().input_index_count(), outputs );
    }
}

#[test]
fn link_roles_record_the_wiring_order()
{
    let config = build_configuration(&two_by_two_by_two(None));
    let mut rng = StdRng::seed_from_u64(1);
    let topology = Cake::new(TopologyBuilderArgument{config:&config,rng:&mut rng});
    for id in 0..topology.num_nodes()
    {
        let (x,y,_z) = topology.id_to_xyz(id);
        let router = topology.router(id);
        let router = router.borrow();
        let metadata = router.core().metadata();
        assert_eq!( metadata.port_x_plus, Some(0) );
        assert_eq!( metadata.port_y_plus, Some(1) );
        if topology.is_elevator(x,y)
        {
            assert_eq!( metadata.port_z_up, Some(2) );
            assert_eq!( metadata.port_z_down, Some(3) );
            assert_eq!( metadata.port_eject, Some(4) );
        }
        else
        {
            assert_eq!( metadata.port_z_up, None );
            assert_eq!( metadata.port_z_down, None );
            assert_eq!( metadata.port_eject, Some(2) );
        }
    }
}

#[test]
fn metadata_carries_the_preferred_elevator()
{
    let config = build_configuration(&two_by_two_by_two(Some("{{0,0},{0,0},{0,0},{0,0}}")));
    let mut rng = StdRng::seed_from_u64(1);
    let topology = Cake::new(TopologyBuilderArgument{config:&config,rng:&mut rng});
    for id in 0..topology.num_nodes()
    {
        let router = topology.router(id);
        let router = router.borrow();
        assert_eq!( router.core().metadata().preferred_elevator, Some((0,0)) );
        assert_eq!( router.core().metadata().grid_sizes, Some((2,2,2)) );
        assert_eq!( router.core().metadata().coordinates, Some(topology.id_to_xyz(id)) );
    }
}

#[test]
fn a_layer_change_goes_through_the_elevator()
{
    let config = build_configuration(&two_by_two_by_two(Some("{{0,0},{0,0},{0,0},{0,0}}")));
    let mut rng = StdRng::seed_from_u64(1);
    let topology = Cake::new(TopologyBuilderArgument{config:&config,rng:&mut rng});
    //From (1,1,0) to (1,1,1): in-plane to the elevator at (0,0), one layer
    //up, and in-plane again. Five hops plus injection and ejection.
    let source = topology.node_id(1,1,0);
    let destination = topology.node_id(1,1,1);
    let delivered = deliver(&topology,Flit::new(5,source,destination,0),32,&mut rng);
    let (arrival,flit) = delivered.expect("the flit should have been delivered");
    assert_eq!( flit.id, 5 );
    assert_eq!( arrival, 7 );
}

#[test]
fn vertical_links_wrap_in_the_layer_index()
{
    let config = build_configuration(&two_by_two_by_two(None));
    let mut rng = StdRng::seed_from_u64(1);
    let topology = Cake::new(TopologyBuilderArgument{config:&config,rng:&mut rng});
    //From the top layer of the elevator back to layer 0: a single vertical
    //hop, whichever sense, thanks to the wrap.
    let source = topology.node_id(0,0,1);
    let destination = topology.node_id(0,0,0);
    let delivered = deliver(&topology,Flit::new(6,source,destination,0),32,&mut rng);
    let (arrival,_) = delivered.expect("the flit should have been delivered");
    assert_eq!( arrival, 3 );
}

#[test]
fn a_faulted_link_stalls_until_cleared()
{
    let config = build_configuration(&two_by_two_by_two(None));
    let mut rng = StdRng::seed_from_u64(1);
    let topology = Cake::new(TopologyBuilderArgument{config:&config,rng:&mut rng});
    let source = topology.node_id(0,0,0);
    let destination = topology.node_id(1,0,0);
    //Fault the X+ output of the source router; the flit must wait, the link
    //staying structurally present.
    topology.router(source).borrow_mut().core_mut().out_channel_fault(0,true);
    assert!( topology.router(source).borrow().core().is_faulty_output(0) );
    topology.injection_channel(source).flit.borrow_mut().send(Flit::new(8,source,destination,0),0);
    let eject = topology.ejection_channel(destination);
    for cycle in 1..=6
    {
        topology.advance(cycle,&mut rng);
        assert!( eject.flit.borrow_mut().receive(cycle).is_none(), "the flit crossed a faulted link" );
    }
    topology.router(source).borrow_mut().core_mut().out_channel_fault(0,false);
    let mut arrival = None;
    for cycle in 7..=12
    {
        topology.advance(cycle,&mut rng);
        if eject.flit.borrow_mut().receive(cycle).is_some()
        {
            arrival = Some(cycle);
            break;
        }
    }
    assert!( arrival.is_some(), "the flit never crossed the cleared link" );
}

#[test]
fn new_topology_dispatches_cake()
{
    let config = build_configuration(&two_by_two_by_two(None));
    let mut rng = StdRng::seed_from_u64(1);
    let topology = new_topology(TopologyBuilderArgument{config:&config,rng:&mut rng});
    assert_eq!( topology.num_nodes(), 8 );
    assert_eq!( topology.num_channels(), 20 );
}

#[test]
#[should_panic(expected="dim_sizes must have at least 2 values")]
fn a_single_dimension_is_fatal()
{
    let config = build_configuration(&[("topology","cake"),("dim_sizes","{4}")]);
    let mut rng = StdRng::seed_from_u64(1);
    new_topology(TopologyBuilderArgument{config:&config,rng:&mut rng});
}
