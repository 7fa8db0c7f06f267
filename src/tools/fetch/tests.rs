#[cfg(test)]
mod tests {
    use crate::error::{ErrorKind, FetchError};
    use crate::tools::fetch::cli::{parse_cookie, parse_header};
    use crate::tools::fetch::{
        default_user_agent, FetchOptions, FetchResult, StatusPolicy, UserAgentKind,
    };
    use reqwest::StatusCode;

    #[test]
    fn status_policies() {
        assert!(StatusPolicy::AnySuccess.accepts(StatusCode::OK));
        assert!(StatusPolicy::AnySuccess.accepts(StatusCode::CREATED));
        assert!(!StatusPolicy::AnySuccess.accepts(StatusCode::NOT_FOUND));
        assert!(StatusPolicy::ExactOk.accepts(StatusCode::OK));
        assert!(!StatusPolicy::ExactOk.accepts(StatusCode::NO_CONTENT));
        assert_eq!(StatusPolicy::default(), StatusPolicy::AnySuccess);
    }

    #[test]
    fn request_agent_kind_tightens_status_policy() {
        let opts = FetchOptions::default().with_user_agent_kind(UserAgentKind::Request);
        assert_eq!(opts.status_policy, StatusPolicy::ExactOk);
        let ua = opts.user_agent.unwrap();
        assert!(ua.starts_with(&default_user_agent()));
        assert!(ua.ends_with(" request"));
    }

    #[test]
    fn options_builder_accumulates_headers_in_order() {
        let opts = FetchOptions::default()
            .with_header("X-One", "1")
            .with_header("X-Two", "2");
        let keys: Vec<_> = opts.extra_headers.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, vec!["X-One", "X-Two"]);
        assert!(!opts.decompress);
        assert!(!opts.preserve_query_on_redirect);
    }

    #[test]
    fn fetch_result_accessors() {
        let ok: FetchResult<String> = FetchResult::Success("body".into());
        assert!(ok.is_success());
        assert_eq!(ok.kind(), None);
        assert_eq!(ok.unwrap_or_default(), "body");

        let empty: FetchResult<String> = FetchResult::Empty;
        assert!(empty.is_empty());
        assert_eq!(empty.into_result().unwrap(), None);

        let failed: FetchResult<String> = FetchError::Server {
            url: "https://example.com".into(),
            status: 404,
        }
        .into();
        assert_eq!(failed.kind(), Some(ErrorKind::ServerError(404)));
        assert_eq!(failed.unwrap_or_default(), "");
    }

    #[test]
    fn fetch_result_map_keeps_failure() {
        let failed: FetchResult<String> = FetchError::CacheMiss("x".into()).into();
        let mapped = failed.map(|s| s.len());
        assert_eq!(mapped.kind(), Some(ErrorKind::CacheMiss));
        let ok = FetchResult::Success("abc".to_string()).map(|s| s.len());
        assert_eq!(ok.ok(), Some(3));
    }

    #[test]
    fn cli_cookie_syntax() {
        let c = parse_cookie("sid=a=b@.example.com/account").unwrap();
        assert_eq!(c.name, "sid");
        assert_eq!(c.value, "a=b");
        assert_eq!(c.domain, ".example.com");
        assert_eq!(c.path, "/account");

        let c = parse_cookie("sid=1@example.com").unwrap();
        assert_eq!(c.path, "/");
        assert!(parse_cookie("sid=1").is_err());
        assert!(parse_cookie("sid@example.com").is_err());
    }

    #[test]
    fn cli_header_syntax() {
        let h = parse_header("X-Api-Key:  secret ").unwrap();
        assert_eq!(h.key, "X-Api-Key");
        assert_eq!(h.value, "secret");
        assert!(parse_header("no colon").is_err());
    }
}
