
/*!

A Topology builds and owns a specific interconnection graph: the routers, the
channel pairs joining them, and the injection/ejection pairs at every node.

Builders compute their sizes from the configuration, allocate every channel
pair up front, instantiate one router per node, and wire each router's ports
to channel pairs, recording per-router metadata as they go. After
construction nothing is resized or re-wired; fault flags and the per-class
counters inside the routers are the only state that changes during a run.

see [`new_topology`](fn.new_topology.html) for the available topologies and
their configuration keys.

*/

pub mod unitorus;
pub mod cake;

use std::cell::RefCell;
use std::mem::size_of;
use std::rc::Rc;

use ::rand::rngs::StdRng;

use crate::channel::{ChannelPair,Location,Time};
use crate::config::Configuration;
use crate::quantify::Quantifiable;
use crate::router::Router;
use self::unitorus::UniTorus;
use self::cake::Cake;

/// Some things most uses of the topology module will use.
pub mod prelude
{
	pub use super::{Topology,TopologyBuilderArgument,new_topology,NetworkResources};
	pub use std::cell::RefCell;
	pub use ::rand::rngs::StdRng;
}

///The arrays every topology owns: one router per node, the wired channel
///pairs, and one injection and one ejection pair per node. The injection and
///ejection pairs get their server-side endpoints bound at allocation; the
///builder binds the router sides.
pub struct NetworkResources
{
	routers: Vec<Rc<RefCell<dyn Router>>>,
	channels: Vec<ChannelPair>,
	inject: Vec<ChannelPair>,
	eject: Vec<ChannelPair>,
}

impl NetworkResources
{
	///Allocate every channel pair of a topology of `nodes` nodes and
	///`channels` router-to-router channels. Routers are pushed afterwards by
	///the builder, in node order.
	pub fn allocate(nodes:usize, channels:usize) -> NetworkResources
	{
		let channels = (0..channels).map(|index|ChannelPair::new(&format!("chan{}",index))).collect();
		let inject:Vec<ChannelPair> = (0..nodes).map(|node|ChannelPair::new(&format!("inject{}",node))).collect();
		let eject:Vec<ChannelPair> = (0..nodes).map(|node|ChannelPair::new(&format!("eject{}",node))).collect();
		for (node,pair) in inject.iter().enumerate()
		{
			pair.set_source(Location::ServerPort(node));
		}
		for (node,pair) in eject.iter().enumerate()
		{
			pair.set_sink(Location::ServerPort(node));
		}
		NetworkResources{
			routers: Vec::with_capacity(nodes),
			channels,
			inject,
			eject,
		}
	}
	///Register the next router. Builders create routers in node order, so the
	///returned index equals the node the router serves.
	pub fn push_router(&mut self, router:Rc<RefCell<dyn Router>>) -> usize
	{
		self.routers.push(router);
		self.routers.len()-1
	}
	pub fn num_routers(&self) -> usize
	{
		self.routers.len()
	}
	pub fn num_channels(&self) -> usize
	{
		self.channels.len()
	}
	pub fn routers(&self) -> &[Rc<RefCell<dyn Router>>]
	{
		&self.routers
	}
	pub fn router(&self, index:usize) -> Rc<RefCell<dyn Router>>
	{
		if index >= self.routers.len()
		{
			panic!("router {} out of the {} routers of the topology",index,self.routers.len());
		}
		self.routers[index].clone()
	}
	pub fn channel(&self, index:usize) -> &ChannelPair
	{
		if index >= self.channels.len()
		{
			panic!("channel {} out of the {} channels of the topology",index,self.channels.len());
		}
		&self.channels[index]
	}
	pub fn injection(&self, node:usize) -> &ChannelPair
	{
		&self.inject[node]
	}
	pub fn ejection(&self, node:usize) -> &ChannelPair
	{
		&self.eject[node]
	}
}

impl Quantifiable for NetworkResources
{
	fn total_memory(&self) -> usize
	{
		size_of::<Self>()
			+ self.routers.total_memory()
			+ self.channels.total_memory()
			+ self.inject.total_memory()
			+ self.eject.total_memory()
	}
	fn print_memory_breakdown(&self)
	{
		println!("NetworkResources: {}",self.total_memory());
	}
	fn forecast_total_memory(&self) -> usize
	{
		self.total_memory()
	}
}

///A topology owns the network of one simulation run and drives its routers
///cycle by cycle.
pub trait Topology : Quantifiable
{
	fn resources(&self) -> &NetworkResources;
	fn num_nodes(&self) -> usize
	{
		self.resources().num_routers()
	}
	fn num_channels(&self) -> usize
	{
		self.resources().num_channels()
	}
	fn router(&self, index:usize) -> Rc<RefCell<dyn Router>>
	{
		self.resources().router(index)
	}
	///The pair through which the driver injects flits at a node.
	fn injection_channel(&self, node:usize) -> ChannelPair
	{
		self.resources().injection(node).clone()
	}
	///The pair through which the driver consumes flits ejected at a node.
	fn ejection_channel(&self, node:usize) -> ChannelPair
	{
		self.resources().ejection(node).clone()
	}
	/**
	Run one cycle over the whole router population: phase 1 on every router,
	then phase 2 on every router, then phase 3 on every router. This
	whole-population barrier is the only ordering guarantee of the simulation
	and what makes it deterministic for a fixed configuration and seed: no
	router can observe another router's same-cycle output before everyone has
	read its same-cycle inputs.
	**/
	fn advance(&self, cycle:Time, rng:&mut StdRng)
	{
		for router in self.resources().routers()
		{
			router.borrow_mut().read_inputs(cycle);
		}
		for router in self.resources().routers()
		{
			router.borrow_mut().evaluate(cycle,rng);
		}
		for router in self.resources().routers()
		{
			router.borrow_mut().write_outputs(cycle);
		}
	}
	///Verify that every allocated channel was bound at both ends: each must
	///be exactly one router's output and one router's (or server's) input.
	///A channel left unbound is a builder bug and no safe partial topology
	///exists, so this panics.
	fn check_wiring(&self)
	{
		let resources = self.resources();
		let all = resources.channels.iter()
			.chain(resources.inject.iter())
			.chain(resources.eject.iter());
		for pair in all
		{
			let flit = pair.flit.borrow();
			if *flit.source() == Location::None
			{
				panic!("channel {} has no producer after construction",flit.name());
			}
			if *flit.sink() == Location::None
			{
				panic!("channel {} has no consumer after construction",flit.name());
			}
		}
	}
	///Extension point to mark output links as faulty before a run. The
	///default does nothing; policies decide what to break.
	fn insert_random_faults(&mut self, _config:&Configuration, _rng:&mut StdRng)
	{
	}
}

///The arguments of the `new` method of every topology.
pub struct TopologyBuilderArgument<'a>
{
	///The configuration defining the topology.
	pub config: &'a Configuration,
	///The random number generator to use.
	pub rng: &'a mut StdRng,
}

/**
Build a topology from the `topology` configuration key.

## unitorus

An n-dimensional unidirectional torus: every node has one forward link per
dimension, wrapping at the dimension size. See [UniTorus].
```ignore
topology = unitorus;
dim_sizes = {4,6,8};
dim_latency = {1,2,4};//optional, defaults to 1 per dimension
```

## cake

Stacked 2D unidirectional tori with sparse vertical links at the configured
elevator coordinates. See [Cake].
```ignore
topology = cake;
dim_sizes = {4,4,2};//x, y, layers
elevator_coords = {{0,0},{2,2}};
elevator_mapping_coords = {{{0,0},{0,0},{2,2},{2,2}}, ...};//optional, defaults to identity
```
**/
pub fn new_topology(arg:TopologyBuilderArgument) -> Box<dyn Topology>
{
	match arg.config.get_str("topology")
	{
		Some("unitorus") => Box::new(UniTorus::new(arg)),
		Some("cake") => Box::new(Cake::new(arg)),
		Some(name) => panic!("Unknown topology {}",name),
		None => panic!("a topology must be specified"),
	}
}
