use eyre::{bail, Result, WrapErr};
use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;

use crate::remote::HttpClient;

/// Index document every yum repository publishes.
pub const REPOMD: &str = "repodata/repomd.xml";

const PRIMARY_SUFFIX: &str = "primary.xml.gz";

/// URIs of a yum repository: `repodata/repomd.xml` first, then every
/// metadata file it references, then every package in the primary list.
pub fn repodata_uri_list(client: &HttpClient, base_url: &str) -> Result<Vec<String>> {
    let mut uris = vec![REPOMD.to_string()];
    let repomd_url = format!("{base_url}{REPOMD}");

    log::debug!("Discovering {repomd_url}");
    let repomd = client.get_bytes(&repomd_url)?;
    uris.extend(location_hrefs(&repomd).wrap_err_with(|| format!("parsing {repomd_url}"))?);

    let primary = uris
        .iter()
        .filter(|uri| uri.ends_with(PRIMARY_SUFFIX))
        .collect::<Vec<_>>();
    if primary.len() != 1 {
        bail!("couldn't find filelist in {repomd_url} ({uris:?})");
    }

    let primary_url = format!("{base_url}{}", primary[0]);
    log::debug!("Getting package list: {primary_url}");
    let compressed = client.get_bytes(&primary_url)?;
    let document = gunzip_or_raw(compressed);

    log::debug!("Adding all primary packages location");
    uris.extend(location_hrefs(&document).wrap_err_with(|| format!("parsing {primary_url}"))?);
    Ok(uris)
}

/// Decompress gzip data, or hand back the input untouched when it is not
/// gzip (some servers transparently decompress).
pub fn gunzip_or_raw(data: Vec<u8>) -> Vec<u8> {
    let mut decoded = Vec::new();
    match GzDecoder::new(data.as_slice()).read_to_end(&mut decoded) {
        Ok(_) => decoded,
        Err(err) => {
            log::debug!("primary list is not gzip ({err}), using it as is");
            data
        }
    }
}

/// `href` attribute of every `<location>` element.
pub fn location_hrefs(document: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(document);
    let mut buf = Vec::new();
    let mut hrefs = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == b"location" =>
            {
                for attr in element.attributes() {
                    let attr = attr?;
                    if attr.key.local_name().as_ref() == b"href" {
                        hrefs.push(attr.unescape_value()?.into_owned());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(hrefs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const REPOMD_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo">
  <data type="primary">
    <location href="repodata/abc-primary.xml.gz"/>
  </data>
  <data type="filelists">
    <location href="repodata/def-filelists.xml.gz"/>
  </data>
</repomd>"#;

    #[test]
    fn extracts_location_hrefs() {
        let hrefs = location_hrefs(REPOMD_XML.as_bytes()).unwrap();
        assert_eq!(
            hrefs,
            vec![
                "repodata/abc-primary.xml.gz".to_string(),
                "repodata/def-filelists.xml.gz".to_string()
            ]
        );
    }

    #[test]
    fn unescapes_entities() {
        let xml = r#"<metadata><package><location href="Packages/a&amp;b.rpm"></location></package></metadata>"#;
        assert_eq!(
            location_hrefs(xml.as_bytes()).unwrap(),
            vec!["Packages/a&b.rpm".to_string()]
        );
    }

    #[test]
    fn gunzip_falls_back_to_raw() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"<metadata/>").unwrap();
        let compressed = encoder.finish().unwrap();
        assert_eq!(gunzip_or_raw(compressed), b"<metadata/>");
        assert_eq!(gunzip_or_raw(b"<metadata/>".to_vec()), b"<metadata/>");
    }
}
