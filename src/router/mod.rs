
/*!

A Router is the switching element at one topology node.

It owns its port-to-channel bindings, per-link fault flags, and a metadata
slot that topology builders fill in during construction so that routing
functions can act on purely local information. Every concrete router honors
the same three-phase per-cycle contract, invoked by the topology driver on the
whole population before any router advances to the next cycle:

1. [read_inputs](Router::read_inputs): drain newly arrived flits and credits
   into internal state, without touching the outputs.
2. [evaluate](Router::evaluate): decide from phase-1 state alone, possibly at
   a finer granularity ruled by the internal speedup accumulator.
3. [write_outputs](Router::write_outputs): commit the winners onto output
   channels and return credits upstream.

see [`new_router`](fn.new_router.html) for the concrete variants.

*/

pub mod input_queued;

use std::cell::RefCell;
use std::rc::Rc;

use quantifiable_derive::Quantifiable;//the derive macro
use ::rand::rngs::StdRng;

use crate::channel::{ChannelPair,Location,Time};
use crate::config::Configuration;
use crate::quantify::Quantifiable;
use self::input_queued::InputQueued;

///Topology-embedded routing metadata. Optional: only the topologies that need
///it fill it in. Populated entirely during construction and read-only during
///simulation; the router is a passive store for it, not an enforcer.
#[derive(Clone,Debug,Default,Quantifiable)]
pub struct RouterMetadata
{
	///Sizes (x,y,layers) of the grid this router belongs to.
	pub grid_sizes: Option<(usize,usize,usize)>,
	///The (x,y,z) coordinates of this router.
	pub coordinates: Option<(usize,usize,usize)>,
	///The (x,y) coordinate to travel to when a layer change is required.
	pub preferred_elevator: Option<(usize,usize)>,
	///Port handles recorded at wiring time, one per link role.
	pub port_x_plus: Option<usize>,
	pub port_y_plus: Option<usize>,
	pub port_z_up: Option<usize>,
	pub port_z_down: Option<usize>,
	pub port_eject: Option<usize>,
}

///The state common to every router variant: identity, declared port totals,
///channel bindings, fault flags, timing knobs, and the metadata slot.
#[derive(Debug,Quantifiable)]
pub struct RouterCore
{
	id: usize,
	name: String,
	///Declared port totals. The builder must bind exactly this many.
	inputs: usize,
	outputs: usize,
	///Amount of traffic classes tracked by the accounting.
	classes: usize,
	input_speedup: usize,
	output_speedup: usize,
	internal_speedup: f64,
	partial_internal_cycles: f64,
	///Extra cycles for a flit to traverse the crossbar, added at emission.
	crossbar_delay: Time,
	///Extra cycles for a credit to travel back, on top of the channel latency.
	credit_delay: Time,
	input_channels: Vec<ChannelPair>,
	output_channels: Vec<ChannelPair>,
	///One flag per bound output. A faulted link stays present; routing must
	///just avoid it.
	channel_faults: Vec<bool>,
	metadata: RouterMetadata,
}

impl RouterCore
{
	pub fn new(config:&Configuration, name:&str, id:usize, inputs:usize, outputs:usize) -> RouterCore
	{
		let classes = config.get_usize_or("classes",1);
		let input_speedup = config.get_usize_or("input_speedup",1);
		let output_speedup = config.get_usize_or("output_speedup",1);
		let internal_speedup = config.get_f64_or("internal_speedup",1.0);
		if classes < 1
		{
			panic!("router {} needs at least one traffic class",name);
		}
		if input_speedup < 1 || output_speedup < 1 || internal_speedup <= 0.0
		{
			panic!("the speedups of router {} must be positive",name);
		}
		RouterCore{
			id,
			name: name.to_string(),
			inputs,
			outputs,
			classes,
			input_speedup,
			output_speedup,
			internal_speedup,
			partial_internal_cycles: 0.0,
			crossbar_delay: config.get_usize_or("crossbar_delay",0) as Time,
			credit_delay: config.get_usize_or("credit_delay",0) as Time,
			input_channels: Vec::with_capacity(inputs),
			output_channels: Vec::with_capacity(outputs),
			channel_faults: Vec::with_capacity(outputs),
			metadata: RouterMetadata::default(),
		}
	}
	pub fn id(&self) -> usize
	{
		self.id
	}
	pub fn name(&self) -> &str
	{
		&self.name
	}
	///The declared amount of input ports.
	pub fn num_inputs(&self) -> usize
	{
		self.inputs
	}
	///The declared amount of output ports.
	pub fn num_outputs(&self) -> usize
	{
		self.outputs
	}
	pub fn num_classes(&self) -> usize
	{
		self.classes
	}
	pub fn input_speedup(&self) -> usize
	{
		self.input_speedup
	}
	pub fn output_speedup(&self) -> usize
	{
		self.output_speedup
	}
	pub fn crossbar_delay(&self) -> Time
	{
		self.crossbar_delay
	}
	pub fn credit_delay(&self) -> Time
	{
		self.credit_delay
	}
	///Amount of input ports bound so far.
	pub fn input_index_count(&self) -> usize
	{
		self.input_channels.len()
	}
	///Amount of output ports bound so far. The index a binding receives is
	///this value at the moment just before adding it, and is stable ever after.
	pub fn output_index_count(&self) -> usize
	{
		self.output_channels.len()
	}
	///Bind a channel pair as the next input port. Returns the port handle.
	pub fn add_input_channel(&mut self, pair:&ChannelPair) -> usize
	{
		let index = self.input_channels.len();
		if index >= self.inputs
		{
			panic!("router {} was declared with {} inputs and the builder is binding more",self.name,self.inputs);
		}
		pair.set_sink(Location::RouterPort{ router_index:self.id, router_port:index });
		self.input_channels.push(pair.clone());
		index
	}
	///Bind a channel pair as the next output port. Returns the port handle,
	///for the builder to record under the link role being wired.
	pub fn add_output_channel(&mut self, pair:&ChannelPair) -> usize
	{
		let index = self.output_channels.len();
		if index >= self.outputs
		{
			panic!("router {} was declared with {} outputs and the builder is binding more",self.name,self.outputs);
		}
		pair.set_source(Location::RouterPort{ router_index:self.id, router_port:index });
		self.output_channels.push(pair.clone());
		self.channel_faults.push(false);
		index
	}
	///Bounds-checked port lookup. An out-of-range index is a broken caller.
	pub fn get_input_channel(&self, input:usize) -> &ChannelPair
	{
		if input >= self.input_channels.len()
		{
			panic!("input {} out of the {} bound input ports of router {}",input,self.input_channels.len(),self.name);
		}
		&self.input_channels[input]
	}
	pub fn get_output_channel(&self, output:usize) -> &ChannelPair
	{
		if output >= self.output_channels.len()
		{
			panic!("output {} out of the {} bound output ports of router {}",output,self.output_channels.len(),self.name);
		}
		&self.output_channels[output]
	}
	///Mark or clear a simulated hard fault on an output link. The link stays
	///structurally present.
	pub fn out_channel_fault(&mut self, output:usize, faulty:bool)
	{
		if output >= self.channel_faults.len()
		{
			panic!("output {} out of the {} bound output ports of router {}",output,self.channel_faults.len(),self.name);
		}
		self.channel_faults[output] = faulty;
	}
	pub fn is_faulty_output(&self, output:usize) -> bool
	{
		if output >= self.channel_faults.len()
		{
			panic!("output {} out of the {} bound output ports of router {}",output,self.channel_faults.len(),self.name);
		}
		self.channel_faults[output]
	}
	pub fn metadata(&self) -> &RouterMetadata
	{
		&self.metadata
	}
	pub fn metadata_mut(&mut self) -> &mut RouterMetadata
	{
		&mut self.metadata
	}
	///Advance the fractional-cycle accumulator one external cycle and return
	///how many internal steps fit in it. An internal speedup of 1 gives one
	///step per cycle; 2.5 gives two steps most cycles and three every other.
	pub fn accumulate_internal_cycles(&mut self) -> usize
	{
		self.partial_internal_cycles += self.internal_speedup;
		let steps = self.partial_internal_cycles as usize;
		self.partial_internal_cycles -= steps as f64;
		steps
	}
}

///The per-cycle evaluation contract plus the accounting queries every
///variant must answer exactly, since downstream capacity planning depends on
///exactness.
pub trait Router : Quantifiable
{
	fn core(&self) -> &RouterCore;
	fn core_mut(&mut self) -> &mut RouterCore;
	///Phase 1: drain arrived flits from input channels and arrived credits
	///from output credit channels. Must not affect the outputs this cycle.
	fn read_inputs(&mut self, cycle:Time);
	///Phase 2: routing and crossbar scheduling from phase-1 state only.
	fn evaluate(&mut self, cycle:Time, rng:&mut StdRng);
	///Phase 3: commit decisions onto output channels and return credits.
	fn write_outputs(&mut self, cycle:Time);
	///Credits consumed towards the given output, this is, flits sent and not
	///yet acknowledged by the downstream router.
	fn used_credit(&self, output:usize) -> usize;
	///Flits currently stored at the given input.
	fn buffer_occupancy(&self, input:usize) -> usize;
	fn used_credits(&self) -> Vec<usize>;
	fn free_credits(&self) -> Vec<usize>;
	fn max_credits(&self) -> Vec<usize>;
	#[cfg(feature="track_buffers")]
	fn used_credit_for_class(&self, output:usize, class:usize) -> usize;
	#[cfg(feature="track_buffers")]
	fn buffer_occupancy_for_class(&self, input:usize, class:usize) -> usize;
	#[cfg(feature="track_flows")]
	fn received_flits(&self, class:usize) -> usize;
	#[cfg(feature="track_flows")]
	fn sent_flits(&self, class:usize) -> usize;
	#[cfg(feature="track_flows")]
	fn reset_flow_statistics(&mut self);
	#[cfg(feature="track_stalls")]
	fn buffer_full_stalls(&self, class:usize) -> usize;
	#[cfg(feature="track_stalls")]
	fn crossbar_conflict_stalls(&self, class:usize) -> usize;
	#[cfg(feature="track_stalls")]
	fn reset_stall_statistics(&mut self);
}

///The arguments of the `new` method of every router variant.
pub struct RouterBuilderArgument<'a>
{
	///The whole configuration; variants read their tuning keys from it.
	pub config: &'a Configuration,
	pub name: &'a str,
	pub router_index: usize,
	///Declared port totals. The topology will perform exactly this many
	///bindings before the simulation starts.
	pub inputs: usize,
	pub outputs: usize,
}

/**
Build a router of the variant selected by the `router` configuration key.

Recognized variants:
* `input_queued` (the default): FIFO per input port, credit-counted outputs,
  token or random output arbitration. See [InputQueued].

The returned router has exactly the declared port totals reserved and none
bound; under-binding or over-binding them is a builder bug.
**/
pub fn new_router(arg:RouterBuilderArgument) -> Rc<RefCell<dyn Router>>
{
	match arg.config.get_str_or("router","input_queued")
	{
		"input_queued" => Rc::new(RefCell::new(InputQueued::new(arg))),
		variant => panic!("Unknown router {}",variant),
	}
}
