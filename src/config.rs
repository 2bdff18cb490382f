
/*!

The configuration surface of the core: a plain map from string keys to string
values plus the small list grammars shared by the topology builders.

A configuration text is a sequence of `key = value;` entries, with `//`
starting a comment that extends to the end of its line. Values are kept
verbatim; the brace/comma list grammar inside them is only given meaning by
whoever consumes the key.

```ignore
topology = unitorus;
dim_sizes = {4,6,8};
dim_latency = {1,2,4};
```

Reading text is recoverable and returns a `Result`. Consuming a key with a
malformed value is not: the consumers panic with a diagnostic, since no
partially-valid topology may be built from it.

*/

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use itertools::Itertools;

use crate::error::Error;
use crate::error;

///A set of `key = value` entries, all strings.
#[derive(Debug,Clone,Default)]
pub struct Configuration
{
	entries: BTreeMap<String,String>,
}

impl Configuration
{
	pub fn new() -> Configuration
	{
		Configuration{ entries: BTreeMap::new() }
	}
	///Parse a whole configuration text. See the module documentation for the grammar.
	pub fn from_str(text:&str) -> Result<Configuration,Error>
	{
		let mut entries = BTreeMap::new();
		//Strip comments before splitting on `;`, so a comment may mention semicolons.
		let uncommented:String = text.lines().map(|line|{
			match line.find("//")
			{
				Some(position) => &line[0..position],
				None => line,
			}
		}).collect::<Vec<&str>>().join("\n");
		for entry in uncommented.split(';')
		{
			let entry = entry.trim();
			if entry.is_empty()
			{
				continue;
			}
			let equals = entry.find('=').ok_or_else(||error!(ill_formed_configuration,entry.to_string()).with_message("expected `key = value`".to_string()))?;
			let key = entry[0..equals].trim();
			let value = entry[equals+1..].trim();
			if key.is_empty()
			{
				return Err(error!(ill_formed_configuration,entry.to_string()).with_message("the key is empty".to_string()));
			}
			entries.insert(key.to_string(),value.to_string());
		}
		Ok(Configuration{entries})
	}
	pub fn from_file(path:&Path) -> Result<Configuration,Error>
	{
		let text = fs::read_to_string(path).map_err(|io_error|error!(io,io_error).with_message(format!("could not read configuration from {:?}",path)))?;
		Configuration::from_str(&text)
	}
	///Set an entry programmatically, replacing any previous value.
	pub fn set(&mut self, key:&str, value:&str)
	{
		self.entries.insert(key.to_string(),value.to_string());
	}
	///Raw access to a value. A missing key is the only unset state.
	pub fn get_str(&self, key:&str) -> Option<&str>
	{
		self.entries.get(key).map(|value|value.as_str())
	}
	pub fn get_str_or<'a>(&'a self, key:&str, default:&'a str) -> &'a str
	{
		self.get_str(key).unwrap_or(default)
	}
	///An unsigned integer value. Present but malformed is a fatal configuration error.
	pub fn get_usize(&self, key:&str) -> Option<usize>
	{
		self.get_str(key).map(|value|{
			value.parse().unwrap_or_else(|_|panic!("bad value `{}` for `{}`, expected an unsigned integer",value,key))
		})
	}
	pub fn get_usize_or(&self, key:&str, default:usize) -> usize
	{
		self.get_usize(key).unwrap_or(default)
	}
	pub fn get_f64_or(&self, key:&str, default:f64) -> f64
	{
		match self.get_str(key)
		{
			None => default,
			Some(value) => value.parse().unwrap_or_else(|_|panic!("bad value `{}` for `{}`, expected a number",value,key)),
		}
	}
}

///Parse a comma-separated integer list, tolerating surrounding braces,
///brackets, and whitespace: `{4,6,8}`, `[4, 6, 8]`, and `4,6,8` are all the
///same list. An empty text gives an empty list, for the caller to default.
///A non-integer token is a fatal configuration error.
pub fn parse_integer_list(text:&str, key:&str) -> Vec<i64>
{
	let clean:String = text.chars().map(|c| if c=='{'||c=='}'||c=='['||c==']' {' '} else {c}).collect();
	let mut values = Vec::new();
	for token in clean.split(',')
	{
		let token = token.trim();
		if token.is_empty()
		{
			continue;
		}
		let value:i64 = token.parse().unwrap_or_else(|_|{
			panic!("bad value in {}: `{}` is not an integer. Expected format: {} = {{val1,val2,...}}",key,token,key)
		});
		values.push(value);
	}
	values
}

///Parse a list of coordinate pairs such as `{{0,1},{2,2}}`. Braces and
///brackets act as separators, so looser writings are also accepted; the
///numbers found are consumed in order and paired up. An odd amount of
///numbers is a fatal configuration error.
pub fn parse_coordinate_pairs(text:&str, key:&str) -> Vec<(i64,i64)>
{
	let clean:String = text.chars().map(|c| if c=='{'||c=='}'||c=='['||c==']'||c==',' {' '} else {c}).collect();
	let numbers:Vec<i64> = clean.split_whitespace().map(|token|{
		token.parse().unwrap_or_else(|_|{
			panic!("bad value in {}: `{}` is not an integer",key,token)
		})
	}).collect();
	if numbers.len()%2 != 0
	{
		panic!("{} expects an even amount of integers (x,y pairs), got {}",key,numbers.len());
	}
	numbers.into_iter().tuples().collect()
}

#[cfg(test)]
mod tests
{
	use super::*;
	#[test]
	fn entry_grammar()
	{
		let config = Configuration::from_str("topology = unitorus;\ndim_sizes = {4,6,8}; //three dimensions\n").expect("should parse");
		assert_eq!( config.get_str("topology"), Some("unitorus") );
		assert_eq!( config.get_str("dim_sizes"), Some("{4,6,8}") );
		assert_eq!( config.get_str("dim_latency"), None );
	}
	#[test]
	fn missing_equals_is_an_error()
	{
		assert!( Configuration::from_str("topology unitorus;").is_err() );
	}
	#[test]
	fn integer_list_tolerates_braces_and_whitespace()
	{
		assert_eq!( parse_integer_list("{4,6,8}","dim_sizes"), vec![4,6,8] );
		assert_eq!( parse_integer_list(" [ 4 , 6 , 8 ] ","dim_sizes"), vec![4,6,8] );
		assert_eq!( parse_integer_list("4,6,8","dim_sizes"), vec![4,6,8] );
		assert_eq!( parse_integer_list("","dim_sizes"), Vec::<i64>::new() );
		//Negative values are kept; the consumer validates ranges.
		assert_eq!( parse_integer_list("{0,-1}","dim_penalty"), vec![0,-1] );
	}
	#[test]
	#[should_panic(expected="not an integer")]
	fn integer_list_rejects_garbage()
	{
		parse_integer_list("{4,six,8}","dim_sizes");
	}
	#[test]
	fn coordinate_pairs()
	{
		assert_eq!( parse_coordinate_pairs("{{0,1},{2,2}}","elevator_coords"), vec![(0,1),(2,2)] );
		assert_eq!( parse_coordinate_pairs("0,1 2,2","elevator_coords"), vec![(0,1),(2,2)] );
		assert_eq!( parse_coordinate_pairs("","elevator_coords"), Vec::<(i64,i64)>::new() );
	}
	#[test]
	#[should_panic(expected="even amount")]
	fn coordinate_pairs_reject_odd_counts()
	{
		parse_coordinate_pairs("{{0,1},{2}}","elevator_coords");
	}
	#[test]
	#[should_panic(expected="bad value `x` for `buffer_size`")]
	fn malformed_number_is_fatal()
	{
		let mut config = Configuration::new();
		config.set("buffer_size","x");
		config.get_usize("buffer_size");
	}
}
