
use std::mem::size_of;

use log::{debug,info};

use crate::channel::Time;
use crate::config::{self,Configuration};
use crate::quantify::Quantifiable;
use crate::router::{Router,RouterBuilderArgument,new_router};
use super::prelude::*;

/**
An n-dimensional unidirectional torus: every node has one forward link per
dimension, wrapping at that dimension's size. There are no backward links,
which gives `dimensions * size` channels in total, plus injection/ejection.

Each dimension may carry its own bandwidth, latency, and penalty, all three
lists of exactly the dimension count when given.

Example configuration:
```ignore
topology = unitorus;
dim_sizes = {4,6,8};
dim_bandwidth = {1,1,2};//optional, defaults to 1 per dimension
dim_latency = {1,2,4};//optional, defaults to 1 per dimension
dim_penalty = {0,0,1};//optional, defaults to 0 per dimension
```
**/
pub struct UniTorus
{
	resources: NetworkResources,
	dim_sizes: Vec<usize>,
	dim_bandwidth: Vec<usize>,
	dim_latency: Vec<Time>,
	dim_penalty: Vec<usize>,
}

impl Topology for UniTorus
{
	fn resources(&self) -> &NetworkResources
	{
		&self.resources
	}
}

impl UniTorus
{
	pub fn new(arg:TopologyBuilderArgument) -> UniTorus
	{
		let config = arg.config;
		let dim_sizes = Self::compute_size(config);
		let num_dims = dim_sizes.len();
		let size:usize = dim_sizes.iter().product();
		//One forward channel per node per dimension.
		let num_channels = num_dims * size;
		let dim_bandwidth = parse_per_dimension(config,"dim_bandwidth",num_dims,1,false);
		let dim_latency:Vec<Time> = parse_per_dimension(config,"dim_latency",num_dims,1,false).iter().map(|&value|value as Time).collect();
		let dim_penalty = parse_per_dimension(config,"dim_penalty",num_dims,0,true);
		info!("building unidirectional {}-D torus: {} = {} nodes, {} channels",
			num_dims,
			dim_sizes.iter().map(|side|side.to_string()).collect::<Vec<String>>().join("x"),
			size,num_channels);
		let mut topology = UniTorus{
			resources: NetworkResources::allocate(size,num_channels),
			dim_sizes,
			dim_bandwidth,
			dim_latency,
			dim_penalty,
		};
		topology.build_net(config);
		topology.check_wiring();
		topology
	}
	///Parse and validate `dim_sizes`. Zero dimensions or a non-positive size
	///cannot describe a torus and are fatal.
	fn compute_size(config:&Configuration) -> Vec<usize>
	{
		let text = config.get_str("dim_sizes").unwrap_or_else(||{
			panic!("dim_sizes must be specified as comma-separated values (e.g., dim_sizes = {{4,6,8}})")
		});
		let values = config::parse_integer_list(text,"dim_sizes");
		if values.is_empty()
		{
			panic!("dim_sizes must be specified as comma-separated values (e.g., dim_sizes = {{4,6,8}})");
		}
		values.iter().map(|&value|{
			if value <= 0
			{
				panic!("All dimension sizes must be positive integers. Found: {}",value);
			}
			value as usize
		}).collect()
	}
	///Create every router, wire the forward link of every (node, dimension),
	///and attach injection/ejection. Routers first, channels after, so a
	///forward link can always bind both of its endpoint routers.
	fn build_net(&mut self, config:&Configuration)
	{
		let num_dims = self.dim_sizes.len();
		let size = self.num_nodes_from_sizes();
		for node in 0..size
		{
			let coords = self.node_to_coords(node);
			let name = format!("router_{}",coords.iter().map(|c|c.to_string()).collect::<Vec<String>>().join("_"));
			//One port per dimension plus injection/ejection.
			let router = new_router(RouterBuilderArgument{
				config,
				name:&name,
				router_index:node,
				inputs:num_dims+1,
				outputs:num_dims+1,
			});
			self.resources.push_router(router);
		}
		for node in 0..size
		{
			for dim in 0..num_dims
			{
				let next_node = self.next_node(node,dim);
				let channel = self.channel_index(node,dim);
				let pair = self.resources.channel(channel).clone();
				debug!("connecting dim {}: node {} -> node {} via channel {} (latency {})",dim,node,next_node,channel,self.dim_latency[dim]);
				let port = self.resources.router(node).borrow_mut().core_mut().add_output_channel(&pair);
				if port != dim
				{
					panic!("output {} of node {} bound out of dimension order (got port {})",dim,node,port);
				}
				self.resources.router(next_node).borrow_mut().core_mut().add_input_channel(&pair);
				pair.set_latency(self.dim_latency[dim]);
			}
		}
		for node in 0..size
		{
			let inject = self.resources.injection(node).clone();
			let eject = self.resources.ejection(node).clone();
			let router = self.resources.router(node);
			router.borrow_mut().core_mut().add_input_channel(&inject);
			let eject_port = router.borrow_mut().core_mut().add_output_channel(&eject);
			router.borrow_mut().core_mut().metadata_mut().port_eject = Some(eject_port);
			inject.set_latency(1);
			eject.set_latency(1);
		}
	}
	///Channel numbering: `node * num_dimensions + dim`.
	fn channel_index(&self, node:usize, dim:usize) -> usize
	{
		node * self.dim_sizes.len() + dim
	}
	///The neighbour reached by the forward link of `dim`, wrapping at the
	///dimension size.
	pub fn next_node(&self, node:usize, dim:usize) -> usize
	{
		let mut coords = self.node_to_coords(node);
		coords[dim] = (coords[dim]+1) % self.dim_sizes[dim];
		self.coords_to_node(&coords)
	}
	///Mixed-radix decomposition of a node identifier, lowest dimension first.
	pub fn node_to_coords(&self, node:usize) -> Vec<usize>
	{
		if node >= self.num_nodes_from_sizes()
		{
			panic!("node {} is greater than the size of the UniTorus {}",node,self.num_nodes_from_sizes());
		}
		let mut remaining = node;
		let mut coords = Vec::with_capacity(self.dim_sizes.len());
		for &side in self.dim_sizes.iter()
		{
			coords.push(remaining%side);
			remaining/=side;
		}
		coords
	}
	///The inverse weighted sum of `node_to_coords`.
	pub fn coords_to_node(&self, coords:&[usize]) -> usize
	{
		for (coord,side) in coords.iter().zip(self.dim_sizes.iter())
		{
			if *coord >= *side
			{
				panic!("coordinate {} is greater than the side {}",coord,side);
			}
		}
		let mut node = 0;
		let mut stride = 1;
		for (dim,&side) in self.dim_sizes.iter().enumerate()
		{
			node += coords[dim]*stride;
			stride *= side;
		}
		node
	}
	fn num_nodes_from_sizes(&self) -> usize
	{
		self.dim_sizes.iter().product()
	}
	pub fn num_dimensions(&self) -> usize
	{
		self.dim_sizes.len()
	}
	pub fn dim_size(&self, dim:usize) -> usize
	{
		self.dim_sizes[dim]
	}
	pub fn dim_sizes(&self) -> &[usize]
	{
		&self.dim_sizes
	}
	pub fn dim_bandwidth(&self, dim:usize) -> usize
	{
		self.dim_bandwidth[dim]
	}
	pub fn dim_latency(&self, dim:usize) -> Time
	{
		self.dim_latency[dim]
	}
	pub fn dim_penalty(&self, dim:usize) -> usize
	{
		self.dim_penalty[dim]
	}
	///Total capacity considering the per-dimension bandwidths.
	pub fn capacity(&self) -> f64
	{
		self.dim_bandwidth.iter().map(|&bandwidth|bandwidth as f64).sum()
	}
}

///Parse one of the optional per-dimension lists. When given, its length must
///equal the dimension count exactly. `allow_zero` distinguishes the penalty
///list from the bandwidth/latency ones.
fn parse_per_dimension(config:&Configuration, key:&str, num_dims:usize, default:usize, allow_zero:bool) -> Vec<usize>
{
	let text = match config.get_str(key)
	{
		None => return vec![default;num_dims],
		Some(text) => text,
	};
	let values = config::parse_integer_list(text,key);
	if values.is_empty()
	{
		return vec![default;num_dims];
	}
	if values.len() != num_dims
	{
		panic!("{} has {} values but topology has {} dimensions. Expected format: {} = {{val1,val2,...,val{}}}",key,values.len(),num_dims,key,num_dims);
	}
	values.iter().map(|&value|{
		if allow_zero
		{
			if value < 0
			{
				panic!("All values in {} must be non-negative integers. Found: {}",key,value);
			}
		}
		else if value <= 0
		{
			panic!("All values in {} must be positive integers. Found: {}",key,value);
		}
		value as usize
	}).collect()
}

impl Quantifiable for UniTorus
{
	fn total_memory(&self) -> usize
	{
		size_of::<Self>()
			+ self.resources.total_memory()
			+ self.dim_sizes.total_memory()
			+ self.dim_bandwidth.total_memory()
			+ self.dim_latency.total_memory()
			+ self.dim_penalty.total_memory()
	}
	fn print_memory_breakdown(&self)
	{
		println!("UniTorus: {}",self.total_memory());
	}
	fn forecast_total_memory(&self) -> usize
	{
		self.total_memory()
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::config::Configuration;
	use rand::SeedableRng;

	fn build(entries:&[(&str,&str)]) -> UniTorus
	{
		let mut config = Configuration::new();
		config.set("topology","unitorus");
		for (key,value) in entries
		{
			config.set(key,value);
		}
		let mut rng = StdRng::seed_from_u64(0);
		UniTorus::new(TopologyBuilderArgument{config:&config,rng:&mut rng})
	}
	#[test]
	fn coordinates_round_trip()
	{
		let topology = build(&[("dim_sizes","{3,4,5}")]);
		for node in 0..topology.num_nodes()
		{
			let coords = topology.node_to_coords(node);
			assert_eq!( topology.coords_to_node(&coords), node, "round trip failed at node {}",node );
		}
	}
	#[test]
	fn forward_links_wrap_around()
	{
		let topology = build(&[("dim_sizes","{3,4}")]);
		//The node at x=2 wraps to x=0, keeping y.
		let node = topology.coords_to_node(&[2,3]);
		assert_eq!( topology.node_to_coords(topology.next_node(node,0)), vec![0,3] );
		assert_eq!( topology.node_to_coords(topology.next_node(node,1)), vec![2,0] );
	}
	#[test]
	fn per_dimension_latency_reaches_the_channels()
	{
		let topology = build(&[("dim_sizes","{2,2}"),("dim_latency","{3,5}")]);
		//Channel node*dims+dim; check both dimensions of node 0.
		assert_eq!( topology.resources().channel(0).flit.borrow().latency(), 3 );
		assert_eq!( topology.resources().channel(1).flit.borrow().latency(), 5 );
		//Injection stays at latency 1.
		assert_eq!( topology.injection_channel(0).flit.borrow().latency(), 1 );
	}
	#[test]
	fn defaults_apply_per_dimension()
	{
		let topology = build(&[("dim_sizes","{4,6,8}")]);
		for dim in 0..3
		{
			assert_eq!( topology.dim_bandwidth(dim), 1 );
			assert_eq!( topology.dim_latency(dim), 1 );
			assert_eq!( topology.dim_penalty(dim), 0 );
		}
		assert_eq!( topology.capacity(), 3.0 );
	}
	#[test]
	#[should_panic(expected="must be positive integers")]
	fn zero_dimension_size_is_fatal()
	{
		build(&[("dim_sizes","{4,0,8}")]);
	}
	#[test]
	#[should_panic(expected="dim_bandwidth has 2 values but topology has 3 dimensions")]
	fn mismatched_bandwidth_list_is_fatal()
	{
		build(&[("dim_sizes","{4,6,8}"),("dim_bandwidth","{1,2}")]);
	}
}
