
/*!

Routing functions: the pluggable policy selecting an output port for a flit.

A routing function sees only the router it is running on, through its
[RouterCore]: identity, fault flags, and the metadata the topology builder
recorded at construction time. There is deliberately no access to global
topology state, so a policy proven here works unchanged in a distributed
setting. Switch and virtual-channel allocation are the router's business, not
the routing function's.

*/

use quantifiable_derive::Quantifiable;//the derive macro

use crate::config::{self,Configuration};
use crate::flit::Flit;
use crate::quantify::Quantifiable;
use crate::router::RouterCore;

///Select the output port for a flit using only locally stored information.
///The returned port may still be rejected by the router if it is faulted or
///out of credits; the flit then stays where it is.
pub trait RoutingFunction : std::fmt::Debug + Quantifiable
{
	fn select_output(&self, core:&RouterCore, flit:&Flit) -> usize;
}

/**
Dimension-ordered routing for the unidirectional torus: resolve the first
dimension whose coordinate does not match the destination, in dimension order.

The UniTorus builder binds the dimension outputs of every router in dimension
order starting at port 0, and records the ejection port in the metadata, which
is all this function relies on.
**/
#[derive(Debug,Quantifiable)]
pub struct DimOrderUniTorus
{
	dim_sizes: Vec<usize>,
}

impl DimOrderUniTorus
{
	pub fn new(config:&Configuration) -> DimOrderUniTorus
	{
		let text = config.get_str("dim_sizes").unwrap_or_else(||panic!("dim_order_unitorus requires `dim_sizes`"));
		let dim_sizes:Vec<usize> = config::parse_integer_list(text,"dim_sizes").iter().map(|&value|{
			if value <= 0
			{
				panic!("All dimension sizes must be positive integers. Found: {}",value);
			}
			value as usize
		}).collect();
		if dim_sizes.is_empty()
		{
			panic!("dim_order_unitorus requires a non-empty `dim_sizes`");
		}
		DimOrderUniTorus{ dim_sizes }
	}
	fn unpack(&self, mut node:usize) -> Vec<usize>
	{
		let mut coordinates = Vec::with_capacity(self.dim_sizes.len());
		for &side in self.dim_sizes.iter()
		{
			coordinates.push(node%side);
			node/=side;
		}
		coordinates
	}
}

impl RoutingFunction for DimOrderUniTorus
{
	fn select_output(&self, core:&RouterCore, flit:&Flit) -> usize
	{
		let current = self.unpack(core.id());
		let target = self.unpack(flit.destination);
		for dim in 0..self.dim_sizes.len()
		{
			if current[dim] != target[dim]
			{
				//Output `dim` is the forward link of dimension `dim`.
				return dim;
			}
		}
		core.metadata().port_eject.unwrap_or_else(||panic!("router {} has no ejection port recorded",core.name()))
	}
}

/**
Dimension-ordered routing for the cake: X+ until the column matches, then Y+
until the row matches, with layer changes going through an elevator.

A flit needing a layer change rides the vertical links wherever it finds
them: if the current node hosts an elevator, it takes the vertical direction
needing fewer hops (Z+ on ties, as the links wrap in both senses); otherwise
it walks in-plane to the preferred elevator recorded in the router metadata.
A preferred target without vertical links is a misconfigured elevator mapping
and is reported fatally the moment a flit needs it.
**/
#[derive(Debug)]
pub struct DorCake;

impl Quantifiable for DorCake
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<Self>()
	}
	fn print_memory_breakdown(&self)
	{
		println!("DorCake: {}",self.total_memory());
	}
	fn forecast_total_memory(&self) -> usize
	{
		std::mem::size_of::<Self>()
	}
}

impl RoutingFunction for DorCake
{
	fn select_output(&self, core:&RouterCore, flit:&Flit) -> usize
	{
		let metadata = core.metadata();
		let (size_x,size_y,layers) = metadata.grid_sizes.unwrap_or_else(||panic!("router {} has no grid sizes recorded",core.name()));
		let (x,y,z) = metadata.coordinates.unwrap_or_else(||panic!("router {} has no coordinates recorded",core.name()));
		let plane = size_x*size_y;
		let dest_z = flit.destination/plane;
		let dest_y = (flit.destination%plane)/size_x;
		let dest_x = flit.destination%size_x;
		if dest_z != z
		{
			if metadata.port_z_up.is_some()
			{
				//Both vertical links wrap; ride the shorter sense.
				let up_hops = (dest_z + layers - z) % layers;
				let down_hops = (z + layers - dest_z) % layers;
				return if up_hops <= down_hops
				{
					metadata.port_z_up.unwrap()
				}
				else
				{
					metadata.port_z_down.unwrap_or_else(||panic!("router {} has an up link but no down link",core.name()))
				};
			}
			let (elevator_x,elevator_y) = metadata.preferred_elevator.unwrap_or_else(||panic!("router {} has no preferred elevator recorded",core.name()));
			if elevator_x == x && elevator_y == y
			{
				panic!("the preferred elevator ({},{}) of router {} has no vertical links",elevator_x,elevator_y,core.name());
			}
			return dor_in_plane(core,x,y,elevator_x,elevator_y);
		}
		if x != dest_x || y != dest_y
		{
			return dor_in_plane(core,x,y,dest_x,dest_y);
		}
		metadata.port_eject.unwrap_or_else(||panic!("router {} has no ejection port recorded",core.name()))
	}
}

///X before Y, both unidirectional.
fn dor_in_plane(core:&RouterCore, x:usize, y:usize, target_x:usize, target_y:usize) -> usize
{
	let metadata = core.metadata();
	if x != target_x
	{
		metadata.port_x_plus.unwrap_or_else(||panic!("router {} has no X+ port recorded",core.name()))
	}
	else if y != target_y
	{
		metadata.port_y_plus.unwrap_or_else(||panic!("router {} has no Y+ port recorded",core.name()))
	}
	else
	{
		panic!("dor_in_plane called with no in-plane movement pending at router {}",core.name());
	}
}

/**
Build the routing function selected by the `routing_function` configuration
key. When the key is absent the topology key decides: `unitorus` implies
`dim_order_unitorus` and `cake` implies `dor_cake`.
**/
pub fn new_routing_function(config:&Configuration) -> Box<dyn RoutingFunction>
{
	let name = match config.get_str("routing_function")
	{
		Some(name) => name,
		None => match config.get_str("topology")
		{
			Some("unitorus") => "dim_order_unitorus",
			Some("cake") => "dor_cake",
			_ => panic!("no routing_function specified and no topology to derive it from"),
		},
	};
	match name
	{
		"dim_order_unitorus" => Box::new(DimOrderUniTorus::new(config)),
		"dor_cake" => Box::new(DorCake),
		_ => panic!("Unknown routing function {}",name),
	}
}
