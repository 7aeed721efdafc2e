//! Layouts produced by different releases of the summarizer.

use mailsumm::{parse, CountedEntry, HourlyBucket, Totals};

fn entry(label: &str, count: u64) -> CountedEntry {
    CountedEntry::new(label, count)
}

const PFLOGSUMM_REPORT: &str = "\
Postfix log summaries for Jun 15

Grand Totals
------------
messages

     22   received
     11   delivered
      0   forwarded
      1   deferred  (3  deferrals)
      0   bounced
      2   rejected (8%)

   1234k  bytes received
    567k  bytes delivered

Per-Day Traffic Summary
    date          received  delivered   deferred    bounced     rejected
    --------------------------------------------------------------------
    Jun 14 2025        7          9          0          0          1
    Jun 15 2025       15          2          1          0          1

Per-Hour Traffic Daily Average
    time          received  delivered   deferred    bounced     rejected
    --------------------------------------------------------------------
    0000-0100           1          1          0          0          0
    0100-0200           0          2          0          0          0

Host/Domain Summary: Message Delivery
 sent cnt  bytes   defers   avg dly max dly host/domain
 -------- -------  -------  ------- ------- -----------
      8    32517k       0     1.2 s    3.4 m  gmail.com
      3     1024        1     0.5 s    0.9 s  example.org

Host/Domain Summary: Messages Received
 msg cnt   bytes   host/domain
 -------- -------  -----------
    688    32517k  host1.domain
     12      900   mx.sender.net

Senders by message count
------------------------
    135   user@example.com
      4   other@example.net

Recipients by message count
---------------------------
    465   someone@example.com
      2   postmaster@example.com

Senders by message size
-----------------------
  12345k  user@example.com
";

#[test]
fn grand_totals_block() {
    let report = parse(PFLOGSUMM_REPORT);
    assert_eq!(
        report.totals,
        Some(Totals {
            received: Some(22),
            sent: Some(11),
        })
    );
}

#[test]
fn per_day_and_per_hour_tables_share_hourly() {
    let report = parse(PFLOGSUMM_REPORT);
    assert_eq!(
        report.hourly,
        vec![
            HourlyBucket {
                period: "Jun 14 2025".to_string(),
                received: 7,
                sent: 9,
            },
            HourlyBucket {
                period: "Jun 15 2025".to_string(),
                received: 15,
                sent: 2,
            },
            HourlyBucket {
                period: "0000-0100".to_string(),
                received: 1,
                sent: 1,
            },
            HourlyBucket {
                period: "0100-0200".to_string(),
                received: 0,
                sent: 2,
            },
        ]
    );
}

#[test]
fn host_tables_with_size_and_delay_columns() {
    let report = parse(PFLOGSUMM_REPORT);
    assert_eq!(
        report.hosts,
        vec![
            entry("gmail.com", 8),
            entry("example.org", 3),
            entry("host1.domain", 688),
            entry("mx.sender.net", 12),
        ]
    );
}

#[test]
fn count_first_senders_and_recipients() {
    let report = parse(PFLOGSUMM_REPORT);
    assert_eq!(
        report.senders,
        vec![entry("user@example.com", 135), entry("other@example.net", 4)]
    );
    assert_eq!(
        report.recipients,
        vec![
            entry("someone@example.com", 465),
            entry("postmaster@example.com", 2)
        ]
    );
}

#[test]
fn top_prefixed_headers() {
    let report = parse(
        "Top Senders by message count\nalice@example.com 7\n\nTop 50 Recipients by message count\n6 carol@example.org\n",
    );
    assert_eq!(report.senders, vec![entry("alice@example.com", 7)]);
    assert_eq!(report.recipients, vec![entry("carol@example.org", 6)]);
}

#[test]
fn perday_without_hyphen() {
    let report = parse("PerDay Traffic Summary\nJun  1 2025   3   4\n");
    assert_eq!(report.hourly.len(), 1);
    assert_eq!(report.hourly[0].period, "Jun  1 2025");
}

#[test]
fn impossible_dates_are_rejected() {
    let report = parse("Per-Day Traffic Summary\nFeb 30 2025   3   4\nMar 01 2025   5   6\n");
    let periods: Vec<&str> = report.hourly.iter().map(|b| b.period.as_str()).collect();
    assert_eq!(periods, vec!["Mar 01 2025"]);
}

#[test]
fn count_first_host_rows_without_size_columns() {
    let report = parse("Host/domain summary\n12   mail.example.com\n");
    assert_eq!(report.hosts, vec![entry("mail.example.com", 12)]);
}

#[test]
fn totals_with_colon_grouping_and_units() {
    let report = parse("Messages received: 1,234\nMessages delivered: 3k\n");
    assert_eq!(
        report.totals,
        Some(Totals {
            received: Some(1234),
            sent: Some(3072),
        })
    );
}

#[test]
fn a_line_sets_at_most_one_total() {
    let report = parse("Messages received 5 Messages sent 6\n");
    assert_eq!(
        report.totals,
        Some(Totals {
            received: Some(5),
            sent: None,
        })
    );
}
