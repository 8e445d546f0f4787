use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChirpError, Result};

/// One raw three-line block as extracted from the corpus.
///
/// Each field is the line remainder after its tag character, padding
/// included, exactly as scanned. Turning a block into a typed `Record`
/// is the job of a parse task, not the scanner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawBlock {
	pub time: String,
	pub user: String,
	pub text: String,
}

/// Calendar timestamp at second resolution, parsed from the corpus
/// `YYYY-MM-DD HH:MM:SS` form.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamp {
	pub year: u16,
	pub month: u8,
	pub day: u8,
	pub hour: u8,
	pub minute: u8,
	pub second: u8,
}

impl FromStr for Timestamp {
	type Err = ChirpError;

	fn from_str(input: &str) -> Result<Self> {
		let malformed = || ChirpError::MalformedRecord {
			message: format!("bad timestamp: {:?}", input),
		};

		let trimmed = input.trim();
		let (date, clock) = trimmed.split_once(' ').ok_or_else(malformed)?;

		let mut date_parts = date.splitn(3, '-');
		let year: u16 = Self::field(&mut date_parts).ok_or_else(malformed)?;
		let month: u8 = Self::field(&mut date_parts).ok_or_else(malformed)?;
		let day: u8 = Self::field(&mut date_parts).ok_or_else(malformed)?;

		let mut clock_parts = clock.splitn(3, ':');
		let hour: u8 = Self::field(&mut clock_parts).ok_or_else(malformed)?;
		let minute: u8 = Self::field(&mut clock_parts).ok_or_else(malformed)?;
		let second: u8 = Self::field(&mut clock_parts).ok_or_else(malformed)?;

		let in_range = (1..=12).contains(&month)
			&& (1..=31).contains(&day)
			&& hour < 24
			&& minute < 60
			&& second < 60;
		if !in_range {
			return Err(malformed());
		}

		Ok(Self { year, month, day, hour, minute, second })
	}
}

impl Timestamp {
	fn field<'a, T: FromStr, I: Iterator<Item = &'a str>>(parts: &mut I) -> Option<T> {
		parts.next()?.parse().ok()
	}
}

impl fmt::Display for Timestamp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
			self.year, self.month, self.day, self.hour, self.minute, self.second
		)
	}
}

/// One parsed corpus record: timestamp, author and message text.
///
/// Immutable once constructed; the learning driver consumes each record
/// exactly once.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Record {
	pub time: Timestamp,
	pub author: String,
	pub text: String,
}

impl Record {
	/// Parses a raw block into a record.
	///
	/// # Errors
	/// `MalformedRecord` if the timestamp does not parse. The author and
	/// text stay unvalidated beyond trimming: the corpus makes no
	/// encoding promises about them.
	pub fn from_block(block: &RawBlock) -> Result<Self> {
		Ok(Self {
			time: block.time.parse()?,
			author: block.user.trim().to_owned(),
			text: block.text.trim().to_owned(),
		})
	}

	/// Whitespace-delimited words of the message text.
	pub fn words(&self) -> impl Iterator<Item = &str> {
		self.text.split_whitespace()
	}
}

impl fmt::Display for Record {
	/// Renders the record back into its three-line corpus form.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "T\t{}", self.time)?;
		writeln!(f, "U\t{}", self.author)?;
		writeln!(f, "W\t{}", self.text)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn timestamp_parses_padded_corpus_form() {
		let time: Timestamp = "       2009-09-30 23:55:53".parse().unwrap();
		assert_eq!(time.year, 2009);
		assert_eq!(time.month, 9);
		assert_eq!(time.day, 30);
		assert_eq!(time.hour, 23);
		assert_eq!(time.minute, 55);
		assert_eq!(time.second, 53);
		assert_eq!(time.to_string(), "2009-09-30 23:55:53");
	}

	#[test]
	fn timestamp_rejects_garbage() {
		for bad in ["", "yesterday", "2009-09-30", "2009-09-30 25:00:00", "2009-13-01 10:00:00"] {
			assert!(
				matches!(bad.parse::<Timestamp>(), Err(ChirpError::MalformedRecord { .. })),
				"accepted {:?}",
				bad
			);
		}
	}

	#[test]
	fn record_from_block_trims_padding() {
		let block = RawBlock {
			time: "       2009-09-30 23:55:53".to_owned(),
			user: "       http://twitter.com/user1".to_owned(),
			text: "       I'm writing my first message!!".to_owned(),
		};

		let record = Record::from_block(&block).unwrap();
		assert_eq!(record.author, "http://twitter.com/user1");
		assert_eq!(record.text, "I'm writing my first message!!");
		assert_eq!(record.words().count(), 5);
	}

	#[test]
	fn record_renders_back_to_corpus_form() {
		let block = RawBlock {
			time: " 2009-09-30 23:55:53".to_owned(),
			user: " http://twitter.com/user1".to_owned(),
			text: " hello world".to_owned(),
		};

		let record = Record::from_block(&block).unwrap();
		let rendered = record.to_string();
		assert!(rendered.starts_with("T\t2009-09-30 23:55:53\n"));
		assert!(rendered.contains("U\thttp://twitter.com/user1\n"));
		assert!(rendered.ends_with("W\thello world\n"));
	}
}
