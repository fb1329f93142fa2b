mod common;

use std::sync::Arc;

use chrono::NaiveDateTime;
use common::{Capture, captured_sink};
use vecready_server::logger::LoggerRegistry;
use vecready_server::telemetry::{LogFormat, LogSink, Severity, TIMESTAMP_FORMAT};

fn emit_all_levels() {
    tracing::debug!("debug line");
    tracing::info!("info line");
    tracing::warn!("warning line");
    tracing::error!("error line");
}

/// Messages (the last column) captured while emitting one event per level.
fn messages_at(level: &str) -> Vec<String> {
    let (_sink, dispatch, capture) = captured_sink(level);
    tracing::dispatcher::with_default(&dispatch, emit_all_levels);
    capture
        .lines()
        .iter()
        .map(|l| l.rsplit(" - ").next().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Severity parsing
// ---------------------------------------------------------------------------

mod severity {
    use super::*;

    #[test]
    fn parses_known_names_case_insensitively() {
        assert_eq!(Severity::parse("DEBUG"), Some(Severity::Debug));
        assert_eq!(Severity::parse("info"), Some(Severity::Info));
        assert_eq!(Severity::parse("Warning"), Some(Severity::Warning));
        assert_eq!(Severity::parse(" error "), Some(Severity::Error));
        assert_eq!(Severity::parse("CRITICAL"), Some(Severity::Critical));
    }

    #[test]
    fn accepts_aliases() {
        assert_eq!(Severity::parse("WARN"), Some(Severity::Warning));
        assert_eq!(Severity::parse("fatal"), Some(Severity::Critical));
    }

    #[test]
    fn unknown_names_fall_back_to_info() {
        for name in ["", "verbose", "TRACE", "NOTSET", "10", "inf o"] {
            assert_eq!(Severity::parse(name), None, "{name:?}");
            assert_eq!(Severity::parse_or_default(name), Severity::Info, "{name:?}");
        }
    }

    #[test]
    fn critical_filters_like_error() {
        assert_eq!(
            Severity::Critical.level_filter(),
            Severity::Error.level_filter()
        );
    }

    #[test]
    fn display_uses_canonical_name() {
        assert_eq!(Severity::Warning.to_string(), "WARNING");
    }
}

// ---------------------------------------------------------------------------
// LogSink
// ---------------------------------------------------------------------------

mod sink {
    use super::*;

    #[test]
    fn no_handler_until_initialized() {
        let (sink, _dispatch) = LogSink::new(LogFormat::Text);
        assert_eq!(sink.handler_count(), 0);
        assert_eq!(sink.severity(), Severity::Info);
    }

    #[test]
    fn repeated_initialize_keeps_one_handler() {
        let (sink, _dispatch) = LogSink::new(LogFormat::Text);
        for _ in 0..10 {
            sink.initialize("DEBUG");
            assert_eq!(sink.handler_count(), 1);
        }
    }

    #[test]
    fn setup_log_is_an_alias_of_initialize() {
        let (a, _da) = LogSink::new(LogFormat::Text);
        let (b, _db) = LogSink::new(LogFormat::Text);
        a.initialize("ERROR");
        b.setup_log("ERROR");
        assert_eq!(a.severity(), b.severity());
        assert_eq!(a.handler_count(), b.handler_count());

        b.setup_log("ERROR");
        assert_eq!(b.handler_count(), 1);
    }

    #[test]
    fn reconfigure_detaches_previous_handler() {
        let (sink, dispatch) = LogSink::new(LogFormat::Text);
        let first = Capture::default();
        let second = Capture::default();

        sink.reconfigure("INFO", first.output());
        tracing::dispatcher::with_default(&dispatch, || tracing::info!("one"));
        sink.reconfigure("INFO", second.output());
        tracing::dispatcher::with_default(&dispatch, || tracing::info!("two"));

        assert_eq!(first.lines().len(), 1);
        assert!(first.contents().contains("one"));
        assert_eq!(second.lines().len(), 1, "each event is written exactly once");
        assert!(second.contents().contains("two"));
    }

    #[test]
    fn threshold_filters_lower_levels() {
        assert_eq!(
            messages_at("WARNING"),
            vec!["warning line".to_string(), "error line".to_string()]
        );
        assert_eq!(messages_at("DEBUG").len(), 4);
        assert_eq!(messages_at("CRITICAL"), vec!["error line".to_string()]);
    }

    #[test]
    fn unknown_level_behaves_like_info() {
        let info = messages_at("INFO");
        assert_eq!(info, vec!["info line", "warning line", "error line"]);
        for name in ["bogus", "", "trace", "LOUD"] {
            assert_eq!(messages_at(name), info, "level {name:?}");
        }

        let (sink, _dispatch) = LogSink::new(LogFormat::Text);
        sink.initialize("bogus");
        assert_eq!(sink.severity(), Severity::Info);
    }

    #[test]
    fn changing_level_takes_effect_immediately() {
        let (sink, dispatch, capture) = captured_sink("ERROR");
        tracing::dispatcher::with_default(&dispatch, || tracing::info!("hidden"));
        sink.reconfigure("DEBUG", capture.output());
        tracing::dispatcher::with_default(&dispatch, || tracing::info!("shown"));

        let contents = capture.contents();
        assert!(!contents.contains("hidden"));
        assert!(contents.contains("shown"));
    }

    #[test]
    fn dependency_targets_are_capped_at_warning() {
        let (_sink, dispatch, capture) = captured_sink("DEBUG");
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::debug!(target: "hyper::proto", "hyper debug");
            tracing::info!(target: "reqwest::connect", "reqwest info");
            tracing::info!(target: "qdrant_client", "qdrant info");
            tracing::warn!(target: "h2", "h2 warning");
            tracing::debug!(target: "vecready_server::probe", "app debug");
        });

        let contents = capture.contents();
        assert!(!contents.contains("hyper debug"));
        assert!(!contents.contains("reqwest info"));
        assert!(!contents.contains("qdrant info"));
        assert!(contents.contains("h2 warning"));
        assert!(contents.contains("app debug"));
    }

    #[test]
    fn dependency_warnings_pass_even_above_requested_level() {
        let (_sink, dispatch, capture) = captured_sink("ERROR");
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::warn!(target: "reqwest", "pool exhausted");
            tracing::warn!("app warning");
        });

        let contents = capture.contents();
        assert!(contents.contains("pool exhausted"));
        assert!(!contents.contains("app warning"));
    }
}

// ---------------------------------------------------------------------------
// Line format
// ---------------------------------------------------------------------------

mod format {
    use super::*;

    #[test]
    fn text_line_layout() {
        let (_sink, dispatch, capture) = captured_sink("INFO");
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::warn!(target: "app::worker", "queue is full");
        });

        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        let parts: Vec<&str> = lines[0].splitn(4, " - ").collect();
        assert_eq!(parts.len(), 4, "line: {}", lines[0]);
        assert!(
            NaiveDateTime::parse_from_str(parts[0], TIMESTAMP_FORMAT).is_ok(),
            "bad timestamp {:?}",
            parts[0]
        );
        assert_eq!(parts[1], "app::worker");
        assert_eq!(parts[2], "WARNING");
        assert_eq!(parts[3], "queue is full");
    }

    #[test]
    fn extra_fields_follow_the_message() {
        let (_sink, dispatch, capture) = captured_sink("INFO");
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!(port = 8080, "listening");
        });
        assert!(capture.contents().ends_with(" - INFO - listening port=8080\n"));
    }

    #[test]
    fn json_format_emits_objects() {
        let (sink, dispatch) = LogSink::new(LogFormat::Json);
        let capture = Capture::default();
        sink.reconfigure("INFO", capture.output());
        tracing::dispatcher::with_default(&dispatch, || tracing::info!(port = 8080, "listening"));

        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        let event: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(event["level"], "INFO");
        assert_eq!(event["fields"]["message"], "listening");
        assert_eq!(event["fields"]["port"], 8080);
    }

    #[test]
    fn log_format_parses() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("TEXT".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn log_format_from_env() {
        temp_env::with_var("LOG_FORMAT", Some("json"), || {
            assert_eq!(LogFormat::from_env(), LogFormat::Json);
        });
        temp_env::with_var("LOG_FORMAT", Some("yaml"), || {
            assert_eq!(LogFormat::from_env(), LogFormat::Text);
        });
        temp_env::with_var_unset("LOG_FORMAT", || {
            assert_eq!(LogFormat::from_env(), LogFormat::Text);
        });
    }
}

// ---------------------------------------------------------------------------
// LoggerRegistry
// ---------------------------------------------------------------------------

mod registry {
    use super::*;

    struct Indexer;

    #[test]
    fn same_name_returns_same_handle() {
        let registry = LoggerRegistry::new();
        for name in ["x", "app.api.routes.health", "", "vecready_server::probe"] {
            let a = registry.get_logger(name);
            let b = registry.get_logger(name);
            assert!(Arc::ptr_eq(&a, &b), "{name:?}");
            assert_eq!(a.name(), name);
        }
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn different_names_get_different_handles() {
        let registry = LoggerRegistry::new();
        let a = registry.get_logger("a");
        let b = registry.get_logger("b");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn racing_first_access_builds_one_handle() {
        let registry = LoggerRegistry::new();
        let handles: Vec<_> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..16)
                .map(|_| s.spawn(|| registry.get_logger("shared")))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn for_type_uses_short_type_name() {
        let registry = LoggerRegistry::new();
        assert_eq!(registry.for_type::<Indexer>().name(), "Indexer");
        assert_eq!(registry.for_type::<Vec<Indexer>>().name(), "Vec");
        assert!(Arc::ptr_eq(
            &registry.for_type::<Indexer>(),
            &registry.get_logger("Indexer")
        ));
    }

    #[test]
    fn logger_name_replaces_target_in_output() {
        let registry = LoggerRegistry::new();
        let (_sink, dispatch, capture) = captured_sink("DEBUG");
        let log = registry.get_logger("app.api.routes.health");
        tracing::dispatcher::with_default(&dispatch, || {
            log.info("Health check requested");
            log.warning(format_args!("slow answer after {}ms", 250));
        });

        let lines = capture.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - app.api.routes.health - INFO - Health check requested"));
        assert!(lines[1].ends_with(" - app.api.routes.health - WARNING - slow answer after 250ms"));
    }

    #[test]
    fn logger_respects_threshold() {
        let registry = LoggerRegistry::new();
        let (_sink, dispatch, capture) = captured_sink("INFO");
        let log = registry.get_logger("quiet");
        tracing::dispatcher::with_default(&dispatch, || {
            log.debug("not shown");
            log.error("shown");
        });
        assert_eq!(capture.lines().len(), 1);
        assert_eq!(capture.lines_at("ERROR").len(), 1);
    }

    #[test]
    fn dependency_named_loggers_are_capped_at_warning() {
        let registry = LoggerRegistry::new();
        let (_sink, dispatch, capture) = captured_sink("DEBUG");
        tracing::dispatcher::with_default(&dispatch, || {
            for name in ["qdrant_client", "hyper::proto", "reqwest.connect"] {
                let log = registry.get_logger(name);
                log.debug("chatter");
                log.info("chatter");
                log.warning(format_args!("{name} warned"));
            }
            registry.get_logger("qdrant_client_ext").info("not a dependency");
        });

        let lines = capture.lines();
        assert_eq!(lines.len(), 4, "lines: {lines:?}");
        assert!(lines.iter().all(|l| !l.ends_with("chatter")), "lines: {lines:?}");
        assert_eq!(capture.lines_at("WARNING").len(), 3);
        assert!(lines[3].ends_with(" - qdrant_client_ext - INFO - not a dependency"));
    }
}
