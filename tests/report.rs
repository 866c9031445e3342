mod common;

use common::{sample_engine, LEGITIMATE_URLS, PHISHING_URLS};
use phishguard::report::{read_url_list, write_report};
use std::io::{BufReader, Cursor};

#[test]
fn report_has_header_and_one_row_per_url() {
    let engine = sample_engine();
    let urls = vec![
        "https://www.google.com".to_string(),
        "http://192.168.1.1/login".to_string(),
    ];

    let mut out = Vec::new();
    let summary = write_report(&engine, &urls, &mut out).unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.phishing, 1);
    assert_eq!(summary.legitimate, 1);

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "URL,Result,Confidence,having_IP_Address,URL_Length,Shortining_Service,having_At_Symbol,double_slash_redirecting,Prefix_Suffix,having_Sub_Domain,SSLfinal_State,HTTPS_token"
    );
    assert!(lines[1].starts_with("https://www.google.com,Legitimate,"));
    assert!(lines[2].starts_with("http://192.168.1.1/login,Phishing,"));
    let confidence = lines[2].split(',').nth(2).unwrap();
    assert!(confidence.ends_with('%'));
    assert_eq!(lines[2].split(',').count(), 12);
}

#[test]
fn report_from_file_covers_every_listed_url() {
    let engine = sample_engine();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    {
        use std::io::Write;
        writeln!(file, "# mixed list").unwrap();
        for url in LEGITIMATE_URLS.iter().chain(PHISHING_URLS) {
            writeln!(file, "{}", url).unwrap();
        }
    }

    let urls = read_url_list(BufReader::new(std::fs::File::open(file.path()).unwrap())).unwrap();
    assert_eq!(urls.len(), LEGITIMATE_URLS.len() + PHISHING_URLS.len());

    let mut out = Cursor::new(Vec::new());
    let summary = write_report(&engine, &urls, &mut out).unwrap();
    assert_eq!(summary.total, urls.len());
    assert_eq!(summary.phishing + summary.legitimate, summary.total);
}
