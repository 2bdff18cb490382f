
/*!

Latency-bearing conduits between router ports.

A `Channel<T>` is a directed delay queue: an item sent at cycle `c` becomes
visible to the receiver at cycle `c + latency` and not before. Channels always
come in pairs, a flit channel and its credit return channel, allocated and
destroyed together as a [ChannelPair]. The topology owns every pair; routers
keep shared references to the pairs bound to their ports.

Absence of data is an empty read, never a suspension: `receive` simply
returns `None` when nothing has arrived yet.

*/

use std::cell::RefCell;
use std::collections::VecDeque;
use std::mem::size_of;
use std::rc::Rc;

use quantifiable_derive::Quantifiable;//the derive macro
use crate::flit::{Flit,Credit};
use crate::quantify::Quantifiable;

/// An amount of cycles.
pub type Time = u64;

///A location where a channel endpoint can be bound.
///`None` is used for endpoints not yet bound; a channel left with a `None`
///endpoint at the end of construction is a wiring error.
#[derive(Clone,Debug,Quantifiable,Hash,Eq,PartialEq)]
pub enum Location
{
	RouterPort{
		router_index: usize,
		router_port: usize,
	},
	ServerPort(usize),
	None,
}

///A directed conduit delaying every item by its configured latency.
#[derive(Debug)]
pub struct Channel<T>
{
	name: String,
	latency: Time,
	///In-flight items with the cycle at which each becomes visible.
	queue: VecDeque<(Time,T)>,
	source: Location,
	sink: Location,
}

impl<T> Channel<T>
{
	pub fn new(name:&str) -> Channel<T>
	{
		Channel{
			name: name.to_string(),
			latency: 1,
			queue: VecDeque::new(),
			source: Location::None,
			sink: Location::None,
		}
	}
	pub fn name(&self) -> &str
	{
		&self.name
	}
	pub fn latency(&self) -> Time
	{
		self.latency
	}
	///Latency is a construction-time property; changing it while items are in
	///flight would reorder them.
	pub fn set_latency(&mut self, latency:Time)
	{
		if latency < 1
		{
			panic!("the latency of channel {} must be at least 1 cycle",self.name);
		}
		if !self.queue.is_empty()
		{
			panic!("cannot change the latency of channel {} with items in flight",self.name);
		}
		self.latency = latency;
	}
	///Insert an item at cycle `now`. It will be receivable at `now + latency`.
	pub fn send(&mut self, item:T, now:Time)
	{
		self.queue.push_back((now + self.latency, item));
	}
	///As `send`, with extra cycles on top of the channel latency. Used for the
	///credit return delay.
	pub fn send_delayed(&mut self, item:T, now:Time, extra:Time)
	{
		self.queue.push_back((now + self.latency + extra, item));
	}
	///Extract the front item if it has already arrived at cycle `now`.
	pub fn receive(&mut self, now:Time) -> Option<T>
	{
		match self.queue.front()
		{
			Some(&(ready,_)) if ready <= now => self.queue.pop_front().map(|(_,item)|item),
			_ => None,
		}
	}
	///Amount of items currently in flight.
	pub fn in_flight(&self) -> usize
	{
		self.queue.len()
	}
	pub fn source(&self) -> &Location
	{
		&self.source
	}
	pub fn sink(&self) -> &Location
	{
		&self.sink
	}
	///Record the producing endpoint. Each channel has exactly one producer;
	///binding twice indicates a broken builder.
	pub fn set_source(&mut self, location:Location)
	{
		if self.source != Location::None
		{
			panic!("channel {} already has a source ({:?})",self.name,self.source);
		}
		self.source = location;
	}
	///Record the consuming endpoint, exactly once.
	pub fn set_sink(&mut self, location:Location)
	{
		if self.sink != Location::None
		{
			panic!("channel {} already has a sink ({:?})",self.name,self.sink);
		}
		self.sink = location;
	}
}

impl<T:Quantifiable> Quantifiable for Channel<T>
{
	fn total_memory(&self) -> usize
	{
		size_of::<Self>() + self.name.capacity() + self.queue.total_memory()
	}
	fn print_memory_breakdown(&self)
	{
		println!("Channel {}: {}",self.name,self.total_memory());
	}
	fn forecast_total_memory(&self) -> usize
	{
		self.total_memory()
	}
}

pub type FlitChannel = Channel<Flit>;
pub type CreditChannel = Channel<Credit>;

///A flit channel together with its credit return channel. The credit channel
///points in the opposite direction: its source is the flit sink and its sink
///is the flit source.
#[derive(Clone,Debug)]
pub struct ChannelPair
{
	pub flit: Rc<RefCell<FlitChannel>>,
	pub credit: Rc<RefCell<CreditChannel>>,
}

impl ChannelPair
{
	pub fn new(name:&str) -> ChannelPair
	{
		ChannelPair{
			flit: Rc::new(RefCell::new(Channel::new(name))),
			credit: Rc::new(RefCell::new(Channel::new(&format!("{}_cred",name)))),
		}
	}
	///Set the same latency on both members, as the builders do for every
	///wired link. Each member latency can still be set individually.
	pub fn set_latency(&self, latency:Time)
	{
		self.flit.borrow_mut().set_latency(latency);
		self.credit.borrow_mut().set_latency(latency);
	}
	///Bind the producing side of the pair: the given location emits flits and
	///receives the returned credits.
	pub fn set_source(&self, location:Location)
	{
		self.flit.borrow_mut().set_source(location.clone());
		self.credit.borrow_mut().set_sink(location);
	}
	///Bind the consuming side of the pair: the given location receives flits
	///and emits credits.
	pub fn set_sink(&self, location:Location)
	{
		self.flit.borrow_mut().set_sink(location.clone());
		self.credit.borrow_mut().set_source(location);
	}
}

impl Quantifiable for ChannelPair
{
	fn total_memory(&self) -> usize
	{
		size_of::<Self>() + self.flit.borrow().total_memory() + self.credit.borrow().total_memory()
	}
	fn print_memory_breakdown(&self)
	{
		println!("ChannelPair: {}",self.total_memory());
	}
	fn forecast_total_memory(&self) -> usize
	{
		self.total_memory()
	}
}
