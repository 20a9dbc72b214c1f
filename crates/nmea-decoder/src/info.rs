//! Cumulative Receiver Info

use crate::sentence::{Sentence, SentenceKind, UtcFields};

/// Accumulated view of everything decoded so far
///
/// Each sentence only overwrites the fields it carries, so values persist
/// across sentences and across `parse` calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NmeaInfo {
    /// Bitmask of `SentenceKind::mask` values seen
    pub sentence_mask: u32,
    pub utc: UtcFields,
    pub fix_quality: u8,
    pub satellites_in_use: u32,
    pub satellites_in_view: u32,
    pub hdop: f64,
    /// Signed `DDMM.MMMM`
    pub latitude: f64,
    /// Signed `DDDMM.MMMM`
    pub longitude: f64,
    /// Metres above mean sea level
    pub elevation: f64,
}

impl NmeaInfo {
    /// Whether a sentence of `kind` has been decoded yet
    pub fn has_seen(&self, kind: SentenceKind) -> bool {
        self.sentence_mask & kind.mask() != 0
    }

    /// Fold a decoded sentence into the info
    pub fn apply(&mut self, sentence: &Sentence) {
        self.sentence_mask |= sentence.kind().mask();

        match sentence {
            Sentence::Gga(gga) => {
                if let Some(utc) = gga.utc {
                    self.utc = utc;
                }
                self.fix_quality = gga.fix_quality;
                if let Some(lat) = gga.latitude {
                    self.latitude = lat;
                }
                if let Some(lon) = gga.longitude {
                    self.longitude = lon;
                }
                if let Some(in_use) = gga.satellites_in_use {
                    self.satellites_in_use = in_use;
                    // Until a GSV arrives the in-use count is the only count
                    if !self.has_seen(SentenceKind::Gsv) {
                        self.satellites_in_view = in_use;
                    }
                }
                if let Some(hdop) = gga.hdop {
                    self.hdop = hdop;
                }
                if let Some(elevation) = gga.elevation {
                    self.elevation = elevation;
                }
            }
            Sentence::Rmc(rmc) => {
                if let Some(utc) = rmc.utc {
                    self.utc = utc;
                }
                if rmc.active {
                    if let Some(lat) = rmc.latitude {
                        self.latitude = lat;
                    }
                    if let Some(lon) = rmc.longitude {
                        self.longitude = lon;
                    }
                }
            }
            Sentence::Gsv(gsv) => {
                self.satellites_in_view = gsv.satellites_in_view;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence::{Gga, Gsv, Rmc};

    fn gga(in_use: u32) -> Sentence {
        Sentence::Gga(Gga {
            utc: Some(UtcFields { hour: 1, min: 2, sec: 3, hsec: 4 }),
            latitude: Some(4807.038),
            longitude: Some(-1131.0),
            fix_quality: 1,
            satellites_in_use: Some(in_use),
            hdop: Some(0.9),
            elevation: Some(545.4),
        })
    }

    #[test]
    fn test_gga_sets_in_view_without_gsv() {
        let mut info = NmeaInfo::default();
        info.apply(&gga(7));

        assert_eq!(info.satellites_in_use, 7);
        assert_eq!(info.satellites_in_view, 7);
        assert_eq!(info.longitude, -1131.0);
        assert_eq!(info.elevation, 545.4);
    }

    #[test]
    fn test_gga_only_count_can_fall() {
        let mut info = NmeaInfo::default();
        info.apply(&gga(7));
        info.apply(&gga(0));

        assert_eq!(info.satellites_in_view, 0);
        assert!(!info.has_seen(SentenceKind::Gsv));
    }

    #[test]
    fn test_gga_ignored_for_in_view_after_gsv() {
        let mut info = NmeaInfo::default();
        info.apply(&Sentence::Gsv(Gsv {
            total_messages: 1,
            message_number: 1,
            satellites_in_view: 3,
        }));
        info.apply(&gga(8));

        assert_eq!(info.satellites_in_use, 8);
        assert_eq!(info.satellites_in_view, 3);
    }

    #[test]
    fn test_gsv_sets_in_view() {
        let mut info = NmeaInfo::default();
        info.apply(&gga(4));
        info.apply(&Sentence::Gsv(Gsv {
            total_messages: 2,
            message_number: 1,
            satellites_in_view: 9,
        }));

        assert_eq!(info.satellites_in_view, 9);
        assert_eq!(info.satellites_in_use, 4);
        assert_eq!(info.sentence_mask, 0x05);
    }

    #[test]
    fn test_void_rmc_keeps_position() {
        let mut info = NmeaInfo::default();
        info.apply(&gga(5));
        info.apply(&Sentence::Rmc(Rmc {
            utc: Some(UtcFields { hour: 9, min: 0, sec: 0, hsec: 0 }),
            active: false,
            latitude: Some(1.0),
            longitude: Some(1.0),
        }));

        assert_eq!(info.latitude, 4807.038);
        assert_eq!(info.utc.hour, 9);
    }
}
