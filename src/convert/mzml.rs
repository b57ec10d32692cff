//! Streaming mzML reader
//!
//! Only what the peak table needs is extracted: spectrum index, MS level,
//! first selected-ion m/z, and the m/z and intensity binary arrays.

use std::borrow::Cow;
use std::io::{BufRead, Read};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::read::ZlibDecoder;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::data::Peak;
use crate::error::{Result, ViewerError};

mod cv {
    pub const MS_LEVEL: &[u8] = b"MS:1000511";
    pub const SELECTED_ION_MZ: &[u8] = b"MS:1000744";
    pub const MZ_ARRAY: &[u8] = b"MS:1000514";
    pub const INTENSITY_ARRAY: &[u8] = b"MS:1000515";
    pub const FLOAT_32: &[u8] = b"MS:1000521";
    pub const FLOAT_64: &[u8] = b"MS:1000523";
    pub const ZLIB: &[u8] = b"MS:1000574";
}

/// One decoded spectrum
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub index: i64,
    pub ms_level: u8,
    pub precursor_mz: Option<f64>,
    pub mz: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl Spectrum {
    /// Rows of the peak table; the spectrum index becomes the scan number
    pub fn peaks(&self) -> impl Iterator<Item = Peak> + '_ {
        let precursor = if self.ms_level == 2 {
            self.precursor_mz
        } else {
            None
        };
        self.mz
            .iter()
            .zip(&self.intensity)
            .map(move |(&mz, &intensity)| Peak {
                scan_number: self.index,
                mz,
                intensity,
                ms_level: self.ms_level,
                precursor_mz: precursor,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayKind {
    Mz,
    Intensity,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precision {
    F32,
    F64,
}

#[derive(Debug)]
struct ArrayBuilder {
    kind: ArrayKind,
    precision: Precision,
    zlib: bool,
    encoded: String,
}

impl Default for ArrayBuilder {
    fn default() -> Self {
        Self {
            kind: ArrayKind::Other,
            precision: Precision::F64,
            zlib: false,
            encoded: String::new(),
        }
    }
}

#[derive(Debug, Default)]
struct SpectrumBuilder {
    index: i64,
    ms_level: Option<u8>,
    precursor_mz: Option<f64>,
    mz: Option<Vec<f64>>,
    intensity: Option<Vec<f64>>,
}

impl SpectrumBuilder {
    fn finish(self) -> Result<Spectrum> {
        let ms_level = self.ms_level.ok_or_else(|| {
            ViewerError::Conversion(format!("spectrum {} has no ms level", self.index))
        })?;
        let mz = self.mz.unwrap_or_default();
        let intensity = self.intensity.unwrap_or_default();
        if mz.len() != intensity.len() {
            return Err(ViewerError::Conversion(format!(
                "spectrum {}: {} m/z values but {} intensities",
                self.index,
                mz.len(),
                intensity.len()
            )));
        }
        Ok(Spectrum {
            index: self.index,
            ms_level,
            precursor_mz: self.precursor_mz,
            mz,
            intensity,
        })
    }
}

fn attribute<'a>(e: &'a BytesStart<'a>, name: &[u8]) -> Option<Cow<'a, [u8]>> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name)
        .map(|a| a.value)
}

fn attribute_str(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    attribute(e, name).map(|v| String::from_utf8_lossy(&v).into_owned())
}

fn parse_number<T: std::str::FromStr>(value: Option<String>, what: &str) -> Result<T> {
    let value = value.ok_or_else(|| ViewerError::Conversion(format!("missing {}", what)))?;
    value
        .trim()
        .parse()
        .map_err(|_| ViewerError::Conversion(format!("invalid {} '{}'", what, value)))
}

/// Decode one base64 binary array into f64 values
pub fn decode_array(encoded: &str, zlib: bool, double_precision: bool) -> Result<Vec<f64>> {
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ViewerError::Conversion(format!("bad base64 data: {}", e)))?;

    let bytes = if zlib {
        let mut decoder = ZlibDecoder::new(&raw[..]);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| ViewerError::Conversion(format!("zlib decompression failed: {}", e)))?;
        out
    } else {
        raw
    };

    let width = if double_precision { 8 } else { 4 };
    if bytes.len() % width != 0 {
        return Err(ViewerError::Conversion(format!(
            "binary array of {} bytes is not a multiple of {}",
            bytes.len(),
            width
        )));
    }

    let values = if double_precision {
        bytes
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
            .collect()
    } else {
        bytes
            .chunks_exact(4)
            .map(|c| f64::from(f32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect()
    };
    Ok(values)
}

/// Read every spectrum of an mzML document, calling `on_spectrum` with the
/// running count after each one
pub fn read_spectra<R: BufRead>(
    mut reader: Reader<R>,
    mut on_spectrum: impl FnMut(usize),
) -> Result<Vec<Spectrum>> {
    profiling::scope!("mzml::read_spectra");
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut spectra = Vec::new();
    let mut spectrum: Option<SpectrumBuilder> = None;
    let mut array: Option<ArrayBuilder> = None;
    let mut in_selected_ion = false;
    let mut in_binary = false;
    let mut saw_mzml = false;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            ViewerError::Conversion(format!(
                "XML error at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_start = matches!(event, Event::Start(_));
                match e.local_name().as_ref() {
                    b"mzML" | b"indexedmzML" => saw_mzml = true,
                    b"spectrum" if is_start => {
                        spectrum = Some(SpectrumBuilder {
                            index: parse_number(attribute_str(e, b"index"), "spectrum index")?,
                            ..SpectrumBuilder::default()
                        });
                    }
                    b"selectedIon" if is_start => in_selected_ion = true,
                    b"binaryDataArray" if is_start && spectrum.is_some() => {
                        array = Some(ArrayBuilder::default());
                    }
                    b"binary" if is_start => in_binary = array.is_some(),
                    b"cvParam" => {
                        let accession = attribute(e, b"accession");
                        let accession = accession.as_deref().unwrap_or_default();
                        if let Some(array) = array.as_mut() {
                            match accession {
                                cv::MZ_ARRAY => array.kind = ArrayKind::Mz,
                                cv::INTENSITY_ARRAY => array.kind = ArrayKind::Intensity,
                                cv::FLOAT_32 => array.precision = Precision::F32,
                                cv::FLOAT_64 => array.precision = Precision::F64,
                                cv::ZLIB => array.zlib = true,
                                _ => {}
                            }
                        } else if let Some(spectrum) = spectrum.as_mut() {
                            if accession == cv::MS_LEVEL {
                                let level: u8 = parse_number(attribute_str(e, b"value"), "ms level")?;
                                spectrum.ms_level = Some(level);
                            } else if in_selected_ion
                                && accession == cv::SELECTED_ION_MZ
                                && spectrum.precursor_mz.is_none()
                            {
                                spectrum.precursor_mz = Some(parse_number(
                                    attribute_str(e, b"value"),
                                    "selected ion m/z",
                                )?);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(ref t) if in_binary => {
                if let Some(array) = array.as_mut() {
                    array.encoded.push_str(&String::from_utf8_lossy(t));
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"binary" => in_binary = false,
                b"selectedIon" => in_selected_ion = false,
                b"binaryDataArray" => {
                    if let (Some(done), Some(spectrum)) = (array.take(), spectrum.as_mut()) {
                        let values = decode_array(
                            &done.encoded,
                            done.zlib,
                            done.precision == Precision::F64,
                        )?;
                        match done.kind {
                            ArrayKind::Mz => spectrum.mz = Some(values),
                            ArrayKind::Intensity => spectrum.intensity = Some(values),
                            ArrayKind::Other => {}
                        }
                    }
                }
                b"spectrum" => {
                    if let Some(done) = spectrum.take() {
                        spectra.push(done.finish()?);
                        on_spectrum(spectra.len());
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_mzml {
        return Err(ViewerError::Conversion("not an mzML document".to_string()));
    }
    if spectrum.is_some() {
        return Err(ViewerError::Conversion(
            "document ended inside a spectrum".to_string(),
        ));
    }
    Ok(spectra)
}

/// Open and read an mzML file
pub fn read_file(path: &Path, on_spectrum: impl FnMut(usize)) -> Result<Vec<Spectrum>> {
    let reader = Reader::from_file(path).map_err(|e| {
        ViewerError::Conversion(format!("cannot open {}: {}", path.display(), e))
    })?;
    read_spectra(reader, on_spectrum)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    pub fn encode_f64(values: &[f64], zlib: bool) -> String {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        encode(bytes, zlib)
    }

    pub fn encode_f32(values: &[f32]) -> String {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        encode(bytes, false)
    }

    fn encode(bytes: Vec<u8>, zlib: bool) -> String {
        let bytes = if zlib {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&bytes).unwrap();
            encoder.finish().unwrap()
        } else {
            bytes
        };
        STANDARD.encode(bytes)
    }

    fn array(accession: &str, name: &str, precision: &str, zlib: bool, data: &str) -> String {
        let compression = if zlib {
            r#"<cvParam cvRef="MS" accession="MS:1000574" name="zlib compression" value=""/>"#
        } else {
            r#"<cvParam cvRef="MS" accession="MS:1000576" name="no compression" value=""/>"#
        };
        format!(
            r#"<binaryDataArray encodedLength="{len}">
                <cvParam cvRef="MS" accession="{precision}" name="float" value=""/>
                {compression}
                <cvParam cvRef="MS" accession="{accession}" name="{name}" value=""/>
                <binary>{data}</binary>
              </binaryDataArray>"#,
            len = data.len(),
        )
    }

    /// Scans 0 (MS1, zlib 64-bit), 1 (MS2 of 500.25, 32-bit), 2 (MS1)
    pub fn small_run() -> String {
        let ms1_a = [
            array("MS:1000514", "m/z array", "MS:1000523", true, &encode_f64(&[400.0, 500.25], true)),
            array("MS:1000515", "intensity array", "MS:1000523", true, &encode_f64(&[1000.0, 4000.0], true)),
        ]
        .concat();
        let ms2 = [
            array("MS:1000514", "m/z array", "MS:1000521", false, &encode_f32(&[150.5, 250.0, 350.25])),
            array("MS:1000515", "intensity array", "MS:1000521", false, &encode_f32(&[30.0, 60.0, 15.0])),
        ]
        .concat();
        let ms1_b = [
            array("MS:1000514", "m/z array", "MS:1000523", false, &encode_f64(&[410.0], false)),
            array("MS:1000515", "intensity array", "MS:1000523", false, &encode_f64(&[2000.0], false)),
        ]
        .concat();

        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1.0">
  <run id="test">
    <spectrumList count="3">
      <spectrum index="0" id="scan=1" defaultArrayLength="2">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="1"/>
        <binaryDataArrayList count="2">{ms1_a}</binaryDataArrayList>
      </spectrum>
      <spectrum index="1" id="scan=2" defaultArrayLength="3">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="2"/>
        <precursorList count="1">
          <precursor>
            <selectedIonList count="1">
              <selectedIon>
                <cvParam cvRef="MS" accession="MS:1000744" name="selected ion m/z" value="500.25"/>
                <cvParam cvRef="MS" accession="MS:1000041" name="charge state" value="2"/>
              </selectedIon>
            </selectedIonList>
          </precursor>
        </precursorList>
        <binaryDataArrayList count="2">{ms2}</binaryDataArrayList>
      </spectrum>
      <spectrum index="2" id="scan=3" defaultArrayLength="1">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="1"/>
        <binaryDataArrayList count="2">{ms1_b}</binaryDataArrayList>
      </spectrum>
    </spectrumList>
  </run>
</mzML>
"#
        )
    }
}
