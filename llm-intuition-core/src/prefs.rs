use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

/// Persisted user preferences.
///
/// A tiny key-value file surviving across sessions. The mode flag
/// fail-safes to simulated: live mode needs a credential, so absence or
/// unreadability of the file must never put the user in live mode.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Prefs {
	/// `true` = live streaming mode, `false` = simulated playback.
	#[serde(default)]
	pub real_mode: bool,
	/// Locally stored API key, if the user saved one.
	#[serde(default)]
	pub api_key: Option<String>,
}

impl Prefs {
	/// Loads preferences from `path`.
	///
	/// A missing, unreadable, or malformed file yields the defaults
	/// (simulated mode, no key) rather than an error.
	pub fn load<P: AsRef<Path>>(path: P) -> Self {
		let contents = match fs::read_to_string(&path) {
			Ok(contents) => contents,
			Err(_) => return Self::default(),
		};

		match serde_json::from_str(&contents) {
			Ok(prefs) => prefs,
			Err(err) => {
				warn!(
					"Malformed preference file {}, using defaults: {}",
					path.as_ref().display(),
					err
				);
				Self::default()
			}
		}
	}

	/// Saves preferences to `path` atomically: written to a temporary
	/// file in the same directory, then persisted over the target.
	///
	/// # Errors
	/// Returns an error if the directory is not writable or the rename
	/// fails.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
		let path = path.as_ref();
		let dir = path.parent().unwrap_or_else(|| Path::new("."));

		let file = NamedTempFile::new_in(dir)?;
		serde_json::to_writer_pretty(file.as_file(), self)?;
		file.persist(path)?;
		Ok(())
	}

	/// Flips the mode flag and returns the new value. Callers persist
	/// the change with [`Prefs::save`].
	pub fn toggle_mode(&mut self) -> bool {
		self.real_mode = !self.real_mode;
		self.real_mode
	}
}
