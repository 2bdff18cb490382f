
/*!

The `Error` type returned by the recoverable surface of the crate, which is
essentially the reading of configuration text. Topology and router
construction does not use it: a malformed topology cannot be partially built,
so those paths panic with a diagnostic instead.

Use as `error!(kind_of_error, args)` to create them with the location of the
offending source code.

*/

use std::fmt::{self,Display,Formatter};

///The point of the source code where the error was generated.
#[derive(Debug,Clone,Copy)]
pub struct SourceLocation
{
	pub file: &'static str,
	pub line: u32,
}

impl Display for SourceLocation
{
	fn fmt(&self, f: &mut Formatter) -> fmt::Result
	{
		write!(f,"{}:{}",self.file,self.line)
	}
}

///Capture the current file and line as a `SourceLocation`.
#[macro_export]
macro_rules! source_location{
	() => {{
		$crate::error::SourceLocation{ file: file!(), line: line!() }
	}};
}

///Create an `Error` of the given kind, capturing the source location.
///For example `error!(missing_configuration_key, key.to_string())`.
#[macro_export]
macro_rules! error{
	($kind:ident) => {{
		$crate::error::Error::$kind( $crate::source_location!() )
	}};
	($kind:ident, $($args:expr),*) => {{
		$crate::error::Error::$kind( $crate::source_location!(), $($args),* )
	}};
}

#[derive(Debug)]
pub enum ErrorKind
{
	///Some std::io problem, e.g., when opening a configuration file.
	Io(std::io::Error),
	///A piece of configuration text that does not follow the `key = value;` grammar.
	IllFormedConfiguration(String),
	///A key required to be present was not.
	MissingConfigurationKey(String),
	///Anything without a better classification.
	Undetermined,
}

#[derive(Debug)]
pub struct Error
{
	///Which line of code generated the error.
	pub source_location: SourceLocation,
	pub kind: ErrorKind,
	///Optionally, a human-oriented elaboration.
	pub message: Option<String>,
}

impl Error
{
	pub fn io(source_location:SourceLocation, io_error:std::io::Error) -> Error
	{
		Error{ source_location, kind: ErrorKind::Io(io_error), message: None }
	}
	pub fn ill_formed_configuration(source_location:SourceLocation, text:String) -> Error
	{
		Error{ source_location, kind: ErrorKind::IllFormedConfiguration(text), message: None }
	}
	pub fn missing_configuration_key(source_location:SourceLocation, key:String) -> Error
	{
		Error{ source_location, kind: ErrorKind::MissingConfigurationKey(key), message: None }
	}
	pub fn undetermined(source_location:SourceLocation) -> Error
	{
		Error{ source_location, kind: ErrorKind::Undetermined, message: None }
	}
	///Attach an explanation to the error.
	pub fn with_message(mut self, message:String) -> Error
	{
		self.message = Some(message);
		self
	}
}

impl Display for Error
{
	fn fmt(&self, f: &mut Formatter) -> fmt::Result
	{
		match self.kind
		{
			ErrorKind::Io(ref io_error) => write!(f,"io error ({})",io_error)?,
			ErrorKind::IllFormedConfiguration(ref text) => write!(f,"ill-formed configuration `{}`",text)?,
			ErrorKind::MissingConfigurationKey(ref key) => write!(f,"missing configuration key `{}`",key)?,
			ErrorKind::Undetermined => write!(f,"undetermined error")?,
		}
		if let Some(ref message) = self.message
		{
			write!(f,": {}",message)?;
		}
		write!(f," at {}",self.source_location)
	}
}
