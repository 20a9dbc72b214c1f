//! Sentence Field Decoding
//!
//! Turns one framed `$...*HH` line into a typed sentence. Only the
//! fix-related sentences the receiver emits by default are understood.

use crate::error::SentenceError;
use std::str::FromStr;

/// UTC time of day as broadcast by the receiver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UtcFields {
    pub hour: u8,
    pub min: u8,
    pub sec: u8,
    /// Hundredths of a second
    pub hsec: u8,
}

/// GGA: fix data
#[derive(Debug, Clone, PartialEq)]
pub struct Gga {
    pub utc: Option<UtcFields>,
    /// Signed `DDMM.MMMM` (south negative)
    pub latitude: Option<f64>,
    /// Signed `DDDMM.MMMM` (west negative)
    pub longitude: Option<f64>,
    /// 0 = no fix, 1 = GPS, 2 = DGPS
    pub fix_quality: u8,
    pub satellites_in_use: Option<u32>,
    pub hdop: Option<f64>,
    /// Antenna altitude above mean sea level (metres)
    pub elevation: Option<f64>,
}

/// RMC: recommended minimum data
#[derive(Debug, Clone, PartialEq)]
pub struct Rmc {
    pub utc: Option<UtcFields>,
    /// `A` status flag
    pub active: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// GSV: satellites in view
#[derive(Debug, Clone, PartialEq)]
pub struct Gsv {
    pub total_messages: u8,
    pub message_number: u8,
    pub satellites_in_view: u32,
}

/// Sentence kinds understood by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind {
    Gga,
    Rmc,
    Gsv,
}

impl SentenceKind {
    /// Bit used in `NmeaInfo::sentence_mask`
    pub fn mask(self) -> u32 {
        match self {
            SentenceKind::Gga => 0x01,
            SentenceKind::Rmc => 0x02,
            SentenceKind::Gsv => 0x04,
        }
    }
}

/// A decoded sentence
#[derive(Debug, Clone, PartialEq)]
pub enum Sentence {
    Gga(Gga),
    Rmc(Rmc),
    Gsv(Gsv),
}

impl Sentence {
    /// Decode one line without its CR-LF terminator
    pub fn parse(line: &[u8]) -> Result<Self, SentenceError> {
        let payload = verified_payload(line)?;
        let text = std::str::from_utf8(payload).map_err(|_| SentenceError::InvalidEncoding)?;
        if !text.is_ascii() {
            return Err(SentenceError::InvalidEncoding);
        }

        let fields: Vec<&str> = text.split(',').collect();
        let id = fields[0];
        let kind = match (id.get(..2), id.get(2..)) {
            (Some("GP" | "GN"), Some("GGA")) => SentenceKind::Gga,
            (Some("GP" | "GN"), Some("RMC")) => SentenceKind::Rmc,
            (Some("GP" | "GN"), Some("GSV")) => SentenceKind::Gsv,
            _ => return Err(SentenceError::Unsupported(id.to_string())),
        };

        match kind {
            SentenceKind::Gga => parse_gga(&fields).map(Sentence::Gga),
            SentenceKind::Rmc => parse_rmc(&fields).map(Sentence::Rmc),
            SentenceKind::Gsv => parse_gsv(&fields).map(Sentence::Gsv),
        }
    }

    /// Kind of this sentence
    pub fn kind(&self) -> SentenceKind {
        match self {
            Sentence::Gga(_) => SentenceKind::Gga,
            Sentence::Rmc(_) => SentenceKind::Rmc,
            Sentence::Gsv(_) => SentenceKind::Gsv,
        }
    }
}

/// XOR checksum over the bytes between `$` and `*`
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Strip `$` and `*HH`, returning the payload once the checksum matches
fn verified_payload(line: &[u8]) -> Result<&[u8], SentenceError> {
    let body = line.strip_prefix(b"$").ok_or(SentenceError::MissingStart)?;
    let star = body
        .iter()
        .rposition(|&b| b == b'*')
        .ok_or(SentenceError::MissingChecksum)?;
    let (payload, suffix) = (&body[..star], &body[star + 1..]);

    let hex = suffix.get(..2).ok_or(SentenceError::MissingChecksum)?;
    let hex = std::str::from_utf8(hex).map_err(|_| SentenceError::InvalidEncoding)?;
    let expected = u8::from_str_radix(hex, 16).map_err(|_| SentenceError::InvalidField {
        field: "checksum",
        value: hex.to_string(),
    })?;

    let actual = checksum(payload);
    if expected != actual {
        return Err(SentenceError::ChecksumMismatch { expected, actual });
    }
    Ok(payload)
}

fn require_fields(fields: &[&str], count: usize, name: &'static str) -> Result<(), SentenceError> {
    if fields.len() < count {
        Err(SentenceError::MissingField(name))
    } else {
        Ok(())
    }
}

fn parse_opt<T: FromStr>(value: &str, field: &'static str) -> Result<Option<T>, SentenceError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| SentenceError::InvalidField {
            field,
            value: value.to_string(),
        })
}

/// `hhmmss[.ss]`
fn parse_utc(value: &str) -> Result<Option<UtcFields>, SentenceError> {
    if value.is_empty() {
        return Ok(None);
    }
    let invalid = || SentenceError::InvalidField {
        field: "utc",
        value: value.to_string(),
    };

    let digits = value.get(..6).ok_or_else(invalid)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let two = |i: usize| digits[i..i + 2].parse::<u8>().map_err(|_| invalid());
    let (hour, min, sec) = (two(0)?, two(2)?, two(4)?);
    if hour > 23 || min > 59 || sec > 60 {
        return Err(invalid());
    }

    let hsec = match &value[6..] {
        "" => 0,
        rest => {
            let frac = rest.strip_prefix('.').ok_or_else(invalid)?;
            if !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            match frac.len() {
                0 => 0,
                1 => frac.parse::<u8>().map_err(|_| invalid())? * 10,
                _ => frac[..2].parse::<u8>().map_err(|_| invalid())?,
            }
        }
    };

    Ok(Some(UtcFields { hour, min, sec, hsec }))
}

/// Signed degrees-minutes value from a magnitude and hemisphere field
fn parse_coordinate(
    value: &str,
    hemisphere: &str,
    negative: &str,
    field: &'static str,
) -> Result<Option<f64>, SentenceError> {
    let Some(magnitude) = parse_opt::<f64>(value, field)? else {
        return Ok(None);
    };
    if hemisphere == negative {
        Ok(Some(-magnitude))
    } else if hemisphere.is_empty() || matches!(hemisphere, "N" | "E") {
        Ok(Some(magnitude))
    } else {
        Err(SentenceError::InvalidField {
            field,
            value: hemisphere.to_string(),
        })
    }
}

// $GPGGA,hhmmss.ss,llll.ll,a,yyyyy.yy,a,q,nn,h.h,alt,M,geo,M,age,ref
fn parse_gga(fields: &[&str]) -> Result<Gga, SentenceError> {
    require_fields(fields, 10, "elevation")?;
    Ok(Gga {
        utc: parse_utc(fields[1])?,
        latitude: parse_coordinate(fields[2], fields[3], "S", "latitude")?,
        longitude: parse_coordinate(fields[4], fields[5], "W", "longitude")?,
        fix_quality: parse_opt(fields[6], "fix_quality")?.unwrap_or(0),
        satellites_in_use: parse_opt(fields[7], "satellites_in_use")?,
        hdop: parse_opt(fields[8], "hdop")?,
        elevation: parse_opt(fields[9], "elevation")?,
    })
}

// $GPRMC,hhmmss.ss,A,llll.ll,a,yyyyy.yy,a,spd,cog,ddmmyy,mv,mvE,mode
fn parse_rmc(fields: &[&str]) -> Result<Rmc, SentenceError> {
    require_fields(fields, 7, "longitude")?;
    Ok(Rmc {
        utc: parse_utc(fields[1])?,
        active: fields[2] == "A",
        latitude: parse_coordinate(fields[3], fields[4], "S", "latitude")?,
        longitude: parse_coordinate(fields[5], fields[6], "W", "longitude")?,
    })
}

// $GPGSV,total,num,inview,[prn,elev,azim,snr]...
fn parse_gsv(fields: &[&str]) -> Result<Gsv, SentenceError> {
    require_fields(fields, 4, "satellites_in_view")?;
    Ok(Gsv {
        total_messages: parse_opt(fields[1], "total_messages")?.unwrap_or(0),
        message_number: parse_opt(fields[2], "message_number")?.unwrap_or(0),
        satellites_in_view: parse_opt(fields[3], "satellites_in_view")?
            .ok_or(SentenceError::MissingField("satellites_in_view"))?,
    })
}
