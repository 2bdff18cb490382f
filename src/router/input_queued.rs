
/*!

The input-queued router variant: a FIFO per input port, credit-counted
outputs, and a crossbar matching input heads to outputs, bounded per pass by
the input and output speedups.

*/

use std::collections::VecDeque;

use ::rand::{Rng,rngs::StdRng};
use quantifiable_derive::Quantifiable;//the derive macro

use crate::channel::Time;
use crate::flit::{Credit,Flit};
use crate::quantify::Quantifiable;
use crate::routing::{RoutingFunction,new_routing_function};
use super::{Router,RouterBuilderArgument,RouterCore};

///Strategy for the arbitration of the output ports: the order in which the
///input heads get to claim an output each internal step.
#[derive(Debug,Quantifiable)]
enum OutputArbiter
{
	Random,
	Token{
		port_token: usize,
	},
}

pub struct InputQueued
{
	core: RouterCore,
	routing: Box<dyn RoutingFunction>,
	///Size of each input buffer, also the credit pool of each output.
	buffer_size: usize,
	///Flits drained from the input channels at phase 1, per input port.
	input_buffers: Vec<VecDeque<Flit>>,
	///Flits sent towards each output and not yet credited back.
	credits_used: Vec<usize>,
	///Phase-2 winners, committed at phase 3: `(input it came from, flit)`.
	///Each output accepts up to the output speedup per crossbar pass.
	staged: Vec<Vec<(usize,Flit)>>,
	///Flits each input has forwarded in the current crossbar pass, bounded by
	///the input speedup.
	forwarded: Vec<usize>,
	output_arbiter: OutputArbiter,
	#[cfg(feature="track_buffers")]
	credits_used_per_class: Vec<Vec<usize>>,
	#[cfg(feature="track_flows")]
	received_flits: Vec<usize>,
	#[cfg(feature="track_flows")]
	sent_flits: Vec<usize>,
	#[cfg(feature="track_stalls")]
	buffer_full_stalls: Vec<usize>,
	#[cfg(feature="track_stalls")]
	crossbar_conflict_stalls: Vec<usize>,
}

impl InputQueued
{
	pub fn new(arg:RouterBuilderArgument) -> InputQueued
	{
		let RouterBuilderArgument{config,name,router_index,inputs,outputs} = arg;
		let core = RouterCore::new(config,name,router_index,inputs,outputs);
		let buffer_size = config.get_usize_or("buffer_size",8);
		if buffer_size < 1
		{
			panic!("router {} needs a buffer_size of at least 1 flit",name);
		}
		let output_arbiter = match config.get_str_or("output_arbiter","token")
		{
			"token" => OutputArbiter::Token{ port_token: 0 },
			"random" => OutputArbiter::Random,
			other => panic!("Unknown output_arbiter {}",other),
		};
		#[cfg(feature="track_buffers")]
		let classes = core.num_classes();
		#[cfg(feature="track_flows")]
		let flow_classes = core.num_classes();
		#[cfg(feature="track_stalls")]
		let stall_classes = core.num_classes();
		InputQueued{
			core,
			routing: new_routing_function(config),
			buffer_size,
			input_buffers: (0..inputs).map(|_|VecDeque::new()).collect(),
			credits_used: vec![0;outputs],
			staged: vec![Vec::new();outputs],
			forwarded: vec![0;inputs],
			output_arbiter,
			#[cfg(feature="track_buffers")]
			credits_used_per_class: vec![vec![0;classes];outputs],
			#[cfg(feature="track_flows")]
			received_flits: vec![0;flow_classes],
			#[cfg(feature="track_flows")]
			sent_flits: vec![0;flow_classes],
			#[cfg(feature="track_stalls")]
			buffer_full_stalls: vec![0;stall_classes],
			#[cfg(feature="track_stalls")]
			crossbar_conflict_stalls: vec![0;stall_classes],
		}
	}
	///The order in which inputs are visited this internal step.
	fn arbitration_order(&mut self, rng:&mut StdRng) -> Vec<usize>
	{
		let amount = self.core.input_index_count();
		let start = match self.output_arbiter
		{
			OutputArbiter::Random => if amount==0 {0} else {rng.gen_range(0..amount)},
			OutputArbiter::Token{ref mut port_token} =>
			{
				let start = *port_token;
				if amount > 0
				{
					*port_token = (*port_token+1)%amount;
				}
				start
			},
		};
		(start..amount).chain(0..start).collect()
	}
	///One pass of the crossbar: each input may claim outputs for its queued
	///flits, up to the input speedup per pass, while each output accepts up
	///to the output speedup per pass. The internal speedup decides how many
	///passes fit in one external cycle.
	fn internal_step(&mut self, rng:&mut StdRng)
	{
		let input_speedup = self.core.input_speedup();
		let output_speedup = self.core.output_speedup();
		for value in self.forwarded.iter_mut()
		{
			*value = 0;
		}
		for input in self.arbitration_order(rng)
		{
			while self.forwarded[input] < input_speedup
			{
				let output = match self.input_buffers[input].front()
				{
					None => break,
					Some(flit) => self.routing.select_output(&self.core,flit),
				};
				if self.core.is_faulty_output(output)
				{
					//A faulted link is excluded from forwarding; the flit waits.
					break;
				}
				if self.credits_used[output] + self.staged[output].len() >= self.buffer_size
				{
					#[cfg(feature="track_stalls")]
					{
						let class = self.input_buffers[input].front().unwrap().class;
						self.buffer_full_stalls[class] += 1;
					}
					break;
				}
				if self.staged[output].len() >= output_speedup
				{
					#[cfg(feature="track_stalls")]
					{
						let class = self.input_buffers[input].front().unwrap().class;
						self.crossbar_conflict_stalls[class] += 1;
					}
					break;
				}
				let flit = self.input_buffers[input].pop_front().unwrap();
				self.staged[output].push((input,flit));
				self.forwarded[input] += 1;
			}
		}
	}
}

impl Router for InputQueued
{
	fn core(&self) -> &RouterCore
	{
		&self.core
	}
	fn core_mut(&mut self) -> &mut RouterCore
	{
		&mut self.core
	}
	fn read_inputs(&mut self, cycle:Time)
	{
		for input in 0..self.core.input_index_count()
		{
			let pair = self.core.get_input_channel(input).clone();
			while let Some(flit) = pair.flit.borrow_mut().receive(cycle)
			{
				if self.input_buffers[input].len() >= self.buffer_size
				{
					//The upstream credit discipline should have prevented this.
					panic!("input buffer overflow at input {} of router {}",input,self.core.name());
				}
				#[cfg(feature="track_flows")]
				{
					self.received_flits[flit.class] += 1;
				}
				self.input_buffers[input].push_back(flit);
			}
		}
		for output in 0..self.core.output_index_count()
		{
			let pair = self.core.get_output_channel(output).clone();
			while let Some(credit) = pair.credit.borrow_mut().receive(cycle)
			{
				if self.credits_used[output] == 0
				{
					panic!("credit underflow at output {} of router {}",output,self.core.name());
				}
				self.credits_used[output] -= 1;
				#[cfg(feature="track_buffers")]
				{
					if self.credits_used_per_class[output][credit.class] > 0
					{
						self.credits_used_per_class[output][credit.class] -= 1;
					}
				}
				#[cfg(not(feature="track_buffers"))]
				let _ = credit;
			}
		}
	}
	fn evaluate(&mut self, _cycle:Time, rng:&mut StdRng)
	{
		let steps = self.core.accumulate_internal_cycles();
		for _ in 0..steps
		{
			self.internal_step(rng);
		}
	}
	fn write_outputs(&mut self, cycle:Time)
	{
		let crossbar_delay = self.core.crossbar_delay();
		let credit_delay = self.core.credit_delay();
		for output in 0..self.staged.len()
		{
			let winners:Vec<(usize,Flit)> = self.staged[output].drain(..).collect();
			for (input,flit) in winners
			{
				let class = flit.class;
				let output_pair = self.core.get_output_channel(output).clone();
				output_pair.flit.borrow_mut().send_delayed(flit,cycle,crossbar_delay);
				self.credits_used[output] += 1;
				#[cfg(feature="track_buffers")]
				{
					self.credits_used_per_class[output][class] += 1;
				}
				#[cfg(feature="track_flows")]
				{
					self.sent_flits[class] += 1;
				}
				//The buffer slot is free again; tell the upstream router.
				let input_pair = self.core.get_input_channel(input).clone();
				input_pair.credit.borrow_mut().send_delayed(Credit{class},cycle,credit_delay);
			}
		}
	}
	fn used_credit(&self, output:usize) -> usize
	{
		if output >= self.credits_used.len()
		{
			panic!("output {} out of the {} outputs of router {}",output,self.credits_used.len(),self.core.name());
		}
		self.credits_used[output]
	}
	fn buffer_occupancy(&self, input:usize) -> usize
	{
		if input >= self.input_buffers.len()
		{
			panic!("input {} out of the {} inputs of router {}",input,self.input_buffers.len(),self.core.name());
		}
		self.input_buffers[input].len()
	}
	fn used_credits(&self) -> Vec<usize>
	{
		self.credits_used.clone()
	}
	fn free_credits(&self) -> Vec<usize>
	{
		self.credits_used.iter().map(|&used|self.buffer_size-used).collect()
	}
	fn max_credits(&self) -> Vec<usize>
	{
		vec![self.buffer_size;self.credits_used.len()]
	}
	#[cfg(feature="track_buffers")]
	fn used_credit_for_class(&self, output:usize, class:usize) -> usize
	{
		self.credits_used_per_class[output][class]
	}
	#[cfg(feature="track_buffers")]
	fn buffer_occupancy_for_class(&self, input:usize, class:usize) -> usize
	{
		self.input_buffers[input].iter().filter(|flit|flit.class==class).count()
	}
	#[cfg(feature="track_flows")]
	fn received_flits(&self, class:usize) -> usize
	{
		self.received_flits[class]
	}
	#[cfg(feature="track_flows")]
	fn sent_flits(&self, class:usize) -> usize
	{
		self.sent_flits[class]
	}
	#[cfg(feature="track_flows")]
	fn reset_flow_statistics(&mut self)
	{
		for value in self.received_flits.iter_mut() { *value=0; }
		for value in self.sent_flits.iter_mut() { *value=0; }
	}
	#[cfg(feature="track_stalls")]
	fn buffer_full_stalls(&self, class:usize) -> usize
	{
		self.buffer_full_stalls[class]
	}
	#[cfg(feature="track_stalls")]
	fn crossbar_conflict_stalls(&self, class:usize) -> usize
	{
		self.crossbar_conflict_stalls[class]
	}
	#[cfg(feature="track_stalls")]
	fn reset_stall_statistics(&mut self)
	{
		for value in self.buffer_full_stalls.iter_mut() { *value=0; }
		for value in self.crossbar_conflict_stalls.iter_mut() { *value=0; }
	}
}

impl Quantifiable for InputQueued
{
	fn total_memory(&self) -> usize
	{
		std::mem::size_of::<Self>()
			+ self.core.total_memory()
			+ self.routing.total_memory()
			+ self.input_buffers.total_memory()
			+ self.credits_used.total_memory()
			+ self.staged.total_memory()
			+ self.forwarded.total_memory()
	}
	fn print_memory_breakdown(&self)
	{
		println!("InputQueued {}: {}",self.core.name(),self.total_memory());
	}
	fn forecast_total_memory(&self) -> usize
	{
		self.total_memory()
	}
}
