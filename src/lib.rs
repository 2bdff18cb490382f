/*!
rosco-lib
=====

This crate provides the router/topology core of a cycle-accurate
interconnection network simulator: the per-node switching elements, the
latency-bearing channel pairs joining them under credit-based backpressure,
and the builders that construct whole interconnection graphs from a
configuration.

# Usage

This crate is `rosco-lib`. To use it add `rosco-lib` to your dependencies in
your project's `Cargo.toml`.

```toml
[dependencies]
rosco-lib = "0.3"
```

# Overview

A simulation driver builds a [Topology](topology::Topology) from a
[Configuration](config::Configuration) and then advances it cycle by cycle.
Each cycle runs in three phases over the whole router population: every
router reads its inputs, then every router evaluates, then every router
writes its outputs. Flits and credits move through [channels](channel) whose
configured latency delays visibility by at least one cycle, which is what
makes the phase barrier equivalent to a synchronous clock edge.

```ignore
use rand::{SeedableRng,rngs::StdRng};
use rosco_lib::config::Configuration;
use rosco_lib::topology::{TopologyBuilderArgument,new_topology};

let config = Configuration::from_str("
	topology = unitorus;
	dim_sizes = {4,6,8};
")?;
let mut rng = StdRng::seed_from_u64(1);
let topology = new_topology(TopologyBuilderArgument{config:&config,rng:&mut rng});
for cycle in 1..=1000
{
	//inject through topology.injection_channel(node), then
	topology.advance(cycle,&mut rng);
	//and consume from topology.ejection_channel(node).
}
```

# Configuration Syntax

Configurations are plain `key = value;` entries with `//` comments; see
[config] for the grammar and [topology::new_topology] and
[router::new_router] for the recognized keys of each component.

# Instrumentation

The cargo features `track_flows`, `track_stalls`, and `track_buffers` enable
per-class flow, stall, and occupancy counters on the routers. When disabled
the counter fields do not exist at all, so they impose no overhead.
*/

// At clippy::correctness these should be solved.
// What is the more appropriate way to iterate a couple arrays of same size, while also using the index itself?
	#![allow(clippy::needless_range_loop)]
	// I have several cases that seem cleaner without collapsing.
	#![allow(clippy::collapsible_else_if)]
	#![allow(clippy::match_ref_pats)]
	#![allow(clippy::tabs_in_doc_comments)]

pub use quantifiable_derive::Quantifiable;//the derive macro

pub mod quantify;
pub mod error;
pub mod config;
pub mod flit;
pub mod channel;
pub mod routing;
pub mod router;
pub mod topology;

pub use channel::Time;
pub use flit::{Flit,Credit};

#[cfg(test)]
mod tests {
    #[test]
    fn it_works() {
        assert_eq!(2 + 2, 4);
    }
}
