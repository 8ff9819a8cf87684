//! Debugging feature flags.

pub struct LogFlags {
    /// Log every exchange request (method, path, query).
    pub log_requests: bool,

    /// Log each chunk of a backfill or incremental fetch.
    pub log_chunks: bool,

    /// Log the indicator values written for each analysed candle.
    pub log_analysis: bool,

    /// Log pending-analysis queue rebuilds and enqueues.
    pub log_queue: bool,
}

pub const DF: LogFlags = LogFlags {
    log_requests: false,
    log_chunks: true,
    log_analysis: false,
    log_queue: false,
};
