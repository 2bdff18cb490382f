
use std::collections::BTreeMap;
use std::mem::size_of;

use log::{debug,info};

use crate::config::{self,Configuration};
use crate::quantify::Quantifiable;
use crate::router::{Router,RouterBuilderArgument,new_router};
use super::prelude::*;

/**
The cake: `layers` stacked X by Y unidirectional tori (X+ and Y+ in-plane
links only) with sparse vertical links at the configured elevator
coordinates. Each elevator hosts, per layer, one Z+ (up) and one Z- (down)
link, both wrapping in the layer index. Every node injects and ejects
locally.

Unlike the UniTorus, the amount of ports of a router depends on its position:
a node at an elevator coordinate carries the two vertical links on top of the
two in-plane ones, so the builder sizes each router individually. The output
port handle assigned to each link role (X+, Y+, Z+, Z-, eject) and the
preferred elevator of each (x,y) are recorded on the router metadata, letting
the routing function act on purely local information.

Example configuration:
```ignore
topology = cake;
dim_sizes = {3,3,2};//x, y, layers (layers default to 1)
elevator_coords = {{0,1},{2,2}};
elevator_mapping_coords = {
	{{0,1},{0,1},{2,2}},
	{{0,1},{0,1},{2,2}},
	{{2,2},{2,2},{2,2}},
};//optional, defaults to every coordinate mapping to itself
```
**/
pub struct Cake
{
	resources: NetworkResources,
	size_x: usize,
	size_y: usize,
	layers: usize,
	///The coordinates hosting vertical links, in first-seen order.
	elevators: Vec<(usize,usize)>,
	///Index into `elevators` of each elevator coordinate.
	elevator_index: BTreeMap<(usize,usize),usize>,
	///For each (x,y), which elevator to travel to when changing layers.
	///`elevator_map[y][x]` stores the target pair.
	elevator_map: Vec<Vec<(usize,usize)>>,
	inplane_channels: usize,
	vertical_channels: usize,
}

impl Topology for Cake
{
	fn resources(&self) -> &NetworkResources
	{
		&self.resources
	}
}

impl Cake
{
	pub fn new(arg:TopologyBuilderArgument) -> Cake
	{
		let config = arg.config;
		let (size_x,size_y,layers) = Self::compute_size(config);
		let size = size_x*size_y*layers;
		let (elevators,elevator_index) = Self::parse_elevators(config,size_x,size_y);
		let elevator_map = Self::parse_elevator_map(config,size_x,size_y);
		//In-plane X+ and Y+ per node; up and down per elevator per layer.
		//The total is only known after the elevators are parsed, so the
		//channel array cannot be sized from the topology size alone.
		let inplane_channels = size*2;
		let vertical_channels = elevators.len()*layers*2;
		info!("building cake: {}x{}x{} = {} nodes, {} elevators, {} channels",
			size_x,size_y,layers,size,elevators.len(),inplane_channels+vertical_channels);
		let mut topology = Cake{
			resources: NetworkResources::allocate(size,inplane_channels+vertical_channels),
			size_x,
			size_y,
			layers,
			elevators,
			elevator_index,
			elevator_map,
			inplane_channels,
			vertical_channels,
		};
		topology.build_net(config);
		topology.check_wiring();
		topology
	}
	///Sizes come through `dim_sizes` for consistency with the UniTorus:
	///`{x,y[,layers]}`, with the layer count defaulting to 1.
	fn compute_size(config:&Configuration) -> (usize,usize,usize)
	{
		let text = config.get_str("dim_sizes").unwrap_or_else(||{
			panic!("Cake requires `dim_sizes` to specify {{x,y[,layers]}}")
		});
		let values = config::parse_integer_list(text,"dim_sizes");
		if values.len() < 2
		{
			panic!("dim_sizes must have at least 2 values (x,y)");
		}
		let size_x = values[0];
		let size_y = values[1];
		let layers = if values.len() >= 3 { values[2] } else { 1 };
		if size_x <= 0 || size_y <= 0 || layers <= 0
		{
			panic!("Invalid sizes for Cake: x={} y={} layers={}",size_x,size_y,layers);
		}
		(size_x as usize,size_y as usize,layers as usize)
	}
	///Parse `elevator_coords` (legacy alias `elevatorcoords`): the unique
	///(x,y) coordinates hosting vertical links, indexed in first-seen order.
	fn parse_elevators(config:&Configuration, size_x:usize, size_y:usize) -> (Vec<(usize,usize)>,BTreeMap<(usize,usize),usize>)
	{
		let text = config.get_str("elevator_coords").or_else(||config.get_str("elevatorcoords")).unwrap_or("");
		let mut elevators = Vec::new();
		let mut elevator_index = BTreeMap::new();
		for (raw_x,raw_y) in config::parse_coordinate_pairs(text,"elevator_coords")
		{
			if raw_x < 0 || raw_x >= size_x as i64 || raw_y < 0 || raw_y >= size_y as i64
			{
				panic!("elevator coord out of range: ({},{})",raw_x,raw_y);
			}
			let coord = (raw_x as usize,raw_y as usize);
			//Duplicates collapse to the first occurrence.
			if !elevator_index.contains_key(&coord)
			{
				elevator_index.insert(coord,elevators.len());
				elevators.push(coord);
			}
		}
		(elevators,elevator_index)
	}
	///Parse `elevator_mapping_coords` (legacy alias `elevatormapping`): a
	///dense Y rows by X columns matrix of (x,y) pairs in row-major order.
	///When absent every coordinate maps to itself.
	fn parse_elevator_map(config:&Configuration, size_x:usize, size_y:usize) -> Vec<Vec<(usize,usize)>>
	{
		let text = config.get_str("elevator_mapping_coords").or_else(||config.get_str("elevatormapping"));
		let text = match text
		{
			None => return (0..size_y).map(|y|(0..size_x).map(|x|(x,y)).collect()).collect(),
			Some(text) => text,
		};
		let pairs = config::parse_coordinate_pairs(text,"elevator_mapping_coords");
		if pairs.len() != size_x*size_y
		{
			panic!("elevator_mapping_coords expects {} integers (x,y pairs), got {}",size_x*size_y*2,pairs.len()*2);
		}
		let mut map = vec![Vec::with_capacity(size_x);size_y];
		for (index,&(raw_x,raw_y)) in pairs.iter().enumerate()
		{
			let row = index/size_x;
			let column = index%size_x;
			if raw_x < 0 || raw_x >= size_x as i64 || raw_y < 0 || raw_y >= size_y as i64
			{
				panic!("elevator_mapping_coords out of range at ({},{}) -> ({},{})",column,row,raw_x,raw_y);
			}
			map[row].push((raw_x as usize,raw_y as usize));
		}
		map
	}
	/**
	Create every router and wire the whole network, in a fixed order: all
	routers first (with their metadata), then every X+ link, then every Y+
	link, then the vertical links of each elevator at each layer, then
	injection/ejection. At each link the output port handle just assigned is
	stored on the source router under the corresponding role.
	**/
	fn build_net(&mut self, config:&Configuration)
	{
		let size = self.size_x*self.size_y*self.layers;
		for id in 0..size
		{
			let (x,y,z) = self.id_to_xyz(id);
			let name = format!("router_{}_{}_{}",x,y,z);
			//X+ and Y+ always; Z+/Z- only where an elevator lives.
			let net_ports = if self.is_elevator(x,y) { 4 } else { 2 };
			let router = new_router(RouterBuilderArgument{
				config,
				name:&name,
				router_index:id,
				inputs:net_ports+1,
				outputs:net_ports+1,
			});
			router.borrow_mut().core_mut().metadata_mut().grid_sizes = Some((self.size_x,self.size_y,self.layers));
			router.borrow_mut().core_mut().metadata_mut().coordinates = Some((x,y,z));
			router.borrow_mut().core_mut().metadata_mut().preferred_elevator = Some(self.elevator_map[y][x]);
			self.resources.push_router(router);
		}
		//X+ links, wrapping at the row end.
		for z in 0..self.layers
		{
			for y in 0..self.size_y
			{
				for x in 0..self.size_x
				{
					let from = self.node_id(x,y,z);
					let to = self.node_id((x+1)%self.size_x,y,z);
					let pair = self.resources.channel(self.inplane_channel(from,0)).clone();
					debug!("connecting X+: node {} -> node {}",from,to);
					let from_router = self.resources.router(from);
					let port = from_router.borrow_mut().core_mut().add_output_channel(&pair);
					from_router.borrow_mut().core_mut().metadata_mut().port_x_plus = Some(port);
					self.resources.router(to).borrow_mut().core_mut().add_input_channel(&pair);
					pair.set_latency(1);
				}
			}
		}
		//Y+ links, wrapping at the column end.
		for z in 0..self.layers
		{
			for y in 0..self.size_y
			{
				for x in 0..self.size_x
				{
					let from = self.node_id(x,y,z);
					let to = self.node_id(x,(y+1)%self.size_y,z);
					let pair = self.resources.channel(self.inplane_channel(from,1)).clone();
					debug!("connecting Y+: node {} -> node {}",from,to);
					let from_router = self.resources.router(from);
					let port = from_router.borrow_mut().core_mut().add_output_channel(&pair);
					from_router.borrow_mut().core_mut().metadata_mut().port_y_plus = Some(port);
					self.resources.router(to).borrow_mut().core_mut().add_input_channel(&pair);
					pair.set_latency(1);
				}
			}
		}
		//Vertical links at each elevator, both senses wrapping in the layer index.
		for elevator in 0..self.elevators.len()
		{
			let (x,y) = self.elevators[elevator];
			for z in 0..self.layers
			{
				let from = self.node_id(x,y,z);
				let from_router = self.resources.router(from);
				let to_up = self.node_id(x,y,(z+1)%self.layers);
				let pair = self.resources.channel(self.up_channel(elevator,z)).clone();
				debug!("connecting Z+: node {} -> node {}",from,to_up);
				let port = from_router.borrow_mut().core_mut().add_output_channel(&pair);
				from_router.borrow_mut().core_mut().metadata_mut().port_z_up = Some(port);
				self.resources.router(to_up).borrow_mut().core_mut().add_input_channel(&pair);
				pair.set_latency(1);
				let to_down = self.node_id(x,y,(z+self.layers-1)%self.layers);
				let pair = self.resources.channel(self.down_channel(elevator,z)).clone();
				debug!("connecting Z-: node {} -> node {}",from,to_down);
				let port = from_router.borrow_mut().core_mut().add_output_channel(&pair);
				from_router.borrow_mut().core_mut().metadata_mut().port_z_down = Some(port);
				self.resources.router(to_down).borrow_mut().core_mut().add_input_channel(&pair);
				pair.set_latency(1);
			}
		}
		//Injection is an input; ejection is an output whose handle routing needs.
		for id in 0..size
		{
			let inject = self.resources.injection(id).clone();
			let eject = self.resources.ejection(id).clone();
			let router = self.resources.router(id);
			router.borrow_mut().core_mut().add_input_channel(&inject);
			let eject_port = router.borrow_mut().core_mut().add_output_channel(&eject);
			router.borrow_mut().core_mut().metadata_mut().port_eject = Some(eject_port);
			inject.set_latency(1);
			eject.set_latency(1);
		}
	}
	///Row-major within a layer, then layer-major.
	pub fn node_id(&self, x:usize, y:usize, z:usize) -> usize
	{
		z*(self.size_x*self.size_y) + y*self.size_x + x
	}
	///Inverse of `node_id`.
	pub fn id_to_xyz(&self, id:usize) -> (usize,usize,usize)
	{
		let plane = self.size_x*self.size_y;
		let z = id/plane;
		let remainder = id%plane;
		(remainder%self.size_x,remainder/self.size_x,z)
	}
	///In-plane channel of a node: dim 0 is X+, dim 1 is Y+.
	fn inplane_channel(&self, node:usize, dim:usize) -> usize
	{
		node*2 + dim
	}
	///Vertical channels lay after the in-plane block, interleaved {up,down}
	///per (elevator,layer).
	fn up_channel(&self, elevator:usize, layer:usize) -> usize
	{
		self.inplane_channels + (elevator*self.layers + layer)*2
	}
	fn down_channel(&self, elevator:usize, layer:usize) -> usize
	{
		self.inplane_channels + (elevator*self.layers + layer)*2 + 1
	}
	pub fn x(&self) -> usize
	{
		self.size_x
	}
	pub fn y(&self) -> usize
	{
		self.size_y
	}
	pub fn layers(&self) -> usize
	{
		self.layers
	}
	pub fn is_elevator(&self, x:usize, y:usize) -> bool
	{
		self.elevator_index.contains_key(&(x,y))
	}
	pub fn elevators(&self) -> &[(usize,usize)]
	{
		&self.elevators
	}
	pub fn elevator_map(&self) -> &Vec<Vec<(usize,usize)>>
	{
		&self.elevator_map
	}
	pub fn num_inplane_channels(&self) -> usize
	{
		self.inplane_channels
	}
	pub fn num_vertical_channels(&self) -> usize
	{
		self.vertical_channels
	}
}

impl Quantifiable for Cake
{
	fn total_memory(&self) -> usize
	{
		size_of::<Self>()
			+ self.resources.total_memory()
			+ self.elevators.total_memory()
			+ self.elevator_map.total_memory()
			+ self.elevators.len()*size_of::<((usize,usize),usize)>()
	}
	fn print_memory_breakdown(&self)
	{
		println!("Cake: {}",self.total_memory());
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
	use rand::SeedableRng;

	fn build(entries:&[(&str,&str)]) -> Cake
	{
		let mut config = Configuration::new();
		config.set("topology","cake");
		for (key,value) in entries
		{
			config.set(key,value);
		}
		let mut rng = StdRng::seed_from_u64(0);
		Cake::new(TopologyBuilderArgument{config:&config,rng:&mut rng})
	}
	#[test]
	fn node_numbering_round_trips()
	{
		let topology = build(&[("dim_sizes","{3,4,2}")]);
		for id in 0..topology.num_nodes()
		{
			let (x,y,z) = topology.id_to_xyz(id);
			assert_eq!( topology.node_id(x,y,z), id, "round trip failed at node {}",id );
			assert!( x<3 && y<4 && z<2 );
		}
	}
	#[test]
	fn layers_default_to_one()
	{
		let topology = build(&[("dim_sizes","{3,4}")]);
		assert_eq!( topology.layers(), 1 );
		assert_eq!( topology.num_nodes(), 12 );
	}
	#[test]
	fn duplicated_elevators_collapse_in_first_seen_order()
	{
		let topology = build(&[("dim_sizes","{3,3,2}"),("elevator_coords","{{2,2},{0,1},{2,2}}")]);
		assert_eq!( topology.elevators(), &[(2,2),(0,1)] );
	}
	#[test]
	fn legacy_elevator_key_is_honored()
	{
		let topology = build(&[("dim_sizes","{3,3,2}"),("elevatorcoords","{{1,1}}")]);
		assert_eq!( topology.elevators(), &[(1,1)] );
		assert!( topology.is_elevator(1,1) );
		assert!( !topology.is_elevator(0,0) );
	}
	#[test]
	fn default_mapping_is_the_identity()
	{
		let topology = build(&[("dim_sizes","{3,4,2}"),("elevator_coords","{{0,0}}")]);
		for y in 0..4
		{
			for x in 0..3
			{
				assert_eq!( topology.elevator_map()[y][x], (x,y) );
			}
		}
	}
	#[test]
	#[should_panic(expected="elevator coord out of range: (3,0)")]
	fn out_of_range_elevator_is_fatal()
	{
		build(&[("dim_sizes","{3,3,2}"),("elevator_coords","{{3,0}}")]);
	}
	#[test]
	#[should_panic(expected="elevator_mapping_coords expects 18 integers")]
	fn short_mapping_is_fatal()
	{
		build(&[("dim_sizes","{3,3,1}"),("elevator_mapping_coords","{{0,0},{0,0}}")]);
	}
	#[test]
	#[should_panic(expected="elevator_mapping_coords out of range")]
	fn mapping_target_out_of_grid_is_fatal()
	{
		build(&[("dim_sizes","{2,2,1}"),("elevator_mapping_coords","{{0,0},{0,0},{0,0},{7,0}}")]);
	}
}
