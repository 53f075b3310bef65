use crate::api::scf::logs::{Filter, LogRecord, Request, ERRORS_ONLY};
use crate::api::scf::FunctionPlatform;
use crate::error::{Error, ErrorKind};
use std::time::Duration;

/// Largest page the log API returns
const PAGE_SIZE: u64 = 1000;

/// Which invocations to fetch
#[derive(Debug, Clone)]
pub(crate) struct LogQuery {
    pub(crate) function: String,
    pub(crate) namespace: String,

    /// "YYYY-MM-DD HH:MM:SS"
    pub(crate) start_time: String,
    pub(crate) end_time: String,

    /// Upper bound of records fetched in total
    pub(crate) count: u64,

    /// Only invocations that returned a non-zero code
    pub(crate) errors_only: bool,
}

impl LogQuery {
    /// Newest records first, `offset` records skipped
    fn page(&self, offset: u64, remaining: u64) -> Request {
        Request {
            function_name: self.function.clone(),
            namespace: self.namespace.clone(),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            order: "desc".into(),
            order_by: "start_time".into(),
            offset,
            limit: remaining.min(PAGE_SIZE),
            filter: self.errors_only.then(|| Filter {
                ret_code: ERRORS_ONLY.into(),
            }),
        }
    }
}

/// Pages through function logs
pub(crate) struct LogFetcher<'a> {
    platform: &'a dyn FunctionPlatform,

    /// Pause between pages of a single fetch
    page_delay: Duration,

    /// Pause between polls when tailing
    poll_delay: Duration,
}

impl<'a> LogFetcher<'a> {
    pub(crate) fn new(platform: &'a dyn FunctionPlatform) -> Self {
        LogFetcher {
            platform,
            page_delay: Duration::from_millis(500),
            poll_delay: Duration::from_secs(2),
        }
    }

    pub(crate) fn with_delays(mut self, page_delay: Duration, poll_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self.poll_delay = poll_delay;
        self
    }

    /// Fetch up to `count` records, oldest first
    ///
    /// Stops early once the API returns a page shorter than requested.
    pub(crate) async fn fetch(&self, query: &LogQuery) -> Result<Vec<LogRecord>, Error> {
        let mut records = Vec::new();
        let mut remaining = query.count;

        while remaining > 0 {
            let request = query.page(records.len() as u64, remaining);
            let page = self.request(&request).await?;
            let received = page.len() as u64;

            records.extend(page);
            remaining = remaining.saturating_sub(received);

            if received < request.limit || remaining == 0 {
                break;
            }

            tokio::time::sleep(self.page_delay).await;
        }

        records.reverse();
        Ok(records)
    }

    /// Keep polling until `count` records have been received
    ///
    /// Every page is handed over oldest first, as soon as it arrives.
    pub(crate) async fn tail<F>(&self, query: &LogQuery, mut on_page: F) -> Result<(), Error>
    where
        F: FnMut(Vec<LogRecord>) -> Result<(), Error>,
    {
        let mut offset = 0;
        let mut remaining = query.count;

        while remaining > 0 {
            let mut page = self.request(&query.page(offset, remaining)).await?;
            let received = page.len() as u64;

            offset += received;
            remaining = remaining.saturating_sub(received);

            page.reverse();
            on_page(page)?;

            if remaining > 0 {
                tokio::time::sleep(self.poll_delay).await;
            }
        }

        Ok(())
    }

    async fn request(&self, request: &Request) -> Result<Vec<LogRecord>, Error> {
        log::debug!(
            "Fetching logs of {}/{} (offset {}, limit {})",
            request.namespace,
            request.function_name,
            request.offset,
            request.limit
        );

        self.platform.function_logs(request).await.map_err(|e| {
            log::error!("Failed to fetch logs: {e:?}");

            Error::new(
                ErrorKind::Logs,
                &format!(
                    "Failed to fetch logs of {}/{}",
                    request.namespace, request.function_name
                ),
                Some(&e.to_string()),
            )
            .with_request_id(e.request_id())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePlatform, PlatformCall};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn record(second: u32) -> LogRecord {
        LogRecord {
            start_time: format!("2020-01-01 00:00:{second:02}"),
            ret_code: 0,
            log: format!("invocation {second}"),
            request_id: format!("req-{second}"),
        }
    }

    /// Pages as the API returns them, newest first
    fn platform(pages: Vec<Vec<u32>>) -> FakePlatform {
        let pages = pages
            .into_iter()
            .map(|page| page.into_iter().map(record).collect())
            .collect::<VecDeque<_>>();

        FakePlatform {
            log_pages: Mutex::new(pages),
            ..Default::default()
        }
    }

    fn query(count: u64) -> LogQuery {
        LogQuery {
            function: "hello".into(),
            namespace: "default".into(),
            start_time: "2020-01-01 00:00:00".into(),
            end_time: "2020-01-01 01:00:00".into(),
            count,
            errors_only: false,
        }
    }

    fn fetcher(platform: &FakePlatform) -> LogFetcher<'_> {
        LogFetcher::new(platform).with_delays(Duration::ZERO, Duration::ZERO)
    }

    #[tokio::test]
    async fn records_are_returned_oldest_first() {
        let platform = platform(vec![vec![5, 4, 3, 2, 1]]);

        let records = fetcher(&platform).fetch(&query(10)).await.unwrap();
        let times: Vec<&str> = records.iter().map(|r| r.start_time.as_str()).collect();

        assert_eq!(
            times,
            vec![
                "2020-01-01 00:00:01",
                "2020-01-01 00:00:02",
                "2020-01-01 00:00:03",
                "2020-01-01 00:00:04",
                "2020-01-01 00:00:05",
            ]
        );

        // A short page ends the fetch
        assert_eq!(platform.calls().len(), 1);
    }

    #[tokio::test]
    async fn pages_are_capped_by_the_count_budget() {
        let full: Vec<u32> = (0..1000).collect();
        let platform = platform(vec![full, vec![7, 6]]);

        let records = fetcher(&platform).fetch(&query(1002)).await.unwrap();
        assert_eq!(records.len(), 1002);

        assert_eq!(
            platform.calls(),
            vec![
                PlatformCall::Logs {
                    offset: 0,
                    limit: 1000
                },
                PlatformCall::Logs {
                    offset: 1000,
                    limit: 2
                },
            ]
        );
    }

    #[test]
    fn error_filter_is_sent_only_when_asked() {
        assert!(query(1).page(0, 1).filter.is_none());

        let errors = LogQuery {
            errors_only: true,
            ..query(1)
        };

        assert_eq!(errors.page(0, 1).filter.unwrap().ret_code, "not0");
        assert_eq!(errors.page(0, 1).order, "desc");
    }

    #[tokio::test]
    async fn tail_keeps_polling_past_short_pages() {
        let platform = platform(vec![vec![2, 1], vec![], vec![4, 3]]);
        let mut received = Vec::new();

        fetcher(&platform)
            .tail(&query(4), |page| {
                received.push(page.into_iter().map(|r| r.request_id).collect::<Vec<_>>());
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(
            received,
            vec![
                vec!["req-1".to_string(), "req-2".to_string()],
                vec![],
                vec!["req-3".to_string(), "req-4".to_string()],
            ]
        );
    }
}
