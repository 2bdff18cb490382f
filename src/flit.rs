
/*!

The units travelling through the channels: flits forward and credits
backwards. Payload modeling belongs to the traffic layer, outside this core,
so a flit here is only its forwarding envelope.

*/

use quantifiable_derive::Quantifiable;//the derive macro
use crate::quantify::Quantifiable;

///The atomic unit forwarded between routers.
#[derive(Clone,Debug,Quantifiable)]
pub struct Flit
{
	///Identifier of the flit, unique within whatever the driver decides.
	pub id: usize,
	///The node that injected the flit.
	pub source: usize,
	///The node where the flit must be ejected.
	pub destination: usize,
	///The traffic class, indexing the per-class resource accounting.
	pub class: usize,
	///Whether this is the first flit of its packet.
	pub head: bool,
	///Whether this is the last flit of its packet.
	pub tail: bool,
}

impl Flit
{
	///A single-flit packet, the common case in the tests of this core.
	pub fn new(id:usize, source:usize, destination:usize, class:usize) -> Flit
	{
		Flit{ id, source, destination, class, head:true, tail:true }
	}
}

///A token releasing one unit of buffer space back to the upstream router.
#[derive(Clone,Debug,Quantifiable)]
pub struct Credit
{
	///The traffic class whose space is being released.
	pub class: usize,
}
