/*!
External MRT decoder adapter (spec.md §5): this engine never parses MRT/BMP
wire format itself. It shells out to `<decoder_bin> -m -v <path>` (by default
`bgpdump`, overridable via [`crate::config::Config::decoder_bin`]), matching
the subprocess invocation this engine is derived from, and streams the
decoder's `|`-delimited textual output line by line into
[`RibRecord`]/[`UpdateRecord`].
Failure to launch the decoder, or a non-zero exit, is fatal for that one
file — the caller moves on to the next collector/timestamp rather than
aborting the whole run.
*/
use crate::error::{Error, Result};
use crate::record::{RibRecord, UpdateRecord};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};

fn spawn_decoder(decoder_bin: &str, path: &Path) -> Result<std::process::Child> {
    Command::new(decoder_bin)
        .arg("-m")
        .arg("-v")
        .arg(path)
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Decoder {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

/// Decode a RIB-dump file, logging and skipping any malformed lines rather
/// than failing the whole file on one bad entry.
pub fn decode_rib(decoder_bin: &str, path: &Path) -> Result<Vec<RibRecord>> {
    let mut child = spawn_decoder(decoder_bin, path)?;
    let stdout = child.stdout.take().ok_or_else(|| Error::Decoder {
        path: path.display().to_string(),
        reason: "no stdout from decoder".to_string(),
    })?;

    let mut records = Vec::new();
    for line in BufReader::new(stdout).lines() {
        let line = line?;
        match RibRecord::parse_line(&line) {
            Ok(record) => records.push(record),
            Err(e) => log::debug!("skipping malformed RIB line: {e}"),
        }
    }

    let status = child.wait()?;
    if !status.success() {
        return Err(Error::Decoder {
            path: path.display().to_string(),
            reason: format!("decoder exited with {status}"),
        });
    }

    Ok(records)
}

/// Decode an update-stream file. Unlike RIB lines, update lines the decoder
/// emits but this parser can't classify (anything other than a well-formed
/// withdrawal or announcement) are skipped, matching the reconstruction
/// driver's tolerance for decoder records outside the `A`/`W` contract.
pub fn decode_updates(decoder_bin: &str, path: &Path) -> Result<Vec<UpdateRecord>> {
    let mut child = spawn_decoder(decoder_bin, path)?;
    let stdout = child.stdout.take().ok_or_else(|| Error::Decoder {
        path: path.display().to_string(),
        reason: "no stdout from decoder".to_string(),
    })?;

    let mut records = Vec::new();
    for line in BufReader::new(stdout).lines() {
        let line = line?;
        match UpdateRecord::parse_line(&line) {
            Ok(record) => records.push(record),
            Err(e) => log::debug!("skipping unparseable update line: {e}"),
        }
    }

    let status = child.wait()?;
    if !status.success() {
        return Err(Error::Decoder {
            path: path.display().to_string(),
            reason: format!("decoder exited with {status}"),
        });
    }

    Ok(records)
}
