#[cfg(test)]
mod tests {
    use reqsession::{Error, Session};
    use serde_json::json;

    use crate::*;

    #[test]
    fn test_relative_url_is_joined_onto_base() {
        const PATH: &str = "session_options/base_url/relative";
        let _handle = crate::add_hyper_fixture(PATH, |_| async {
            (crate::json_response(r#"{"where":"relative"}"#), Ok(()))
        });
        let session = crate::init_builder().unwrap().build().unwrap();
        let res = session.get(PATH, &json!({})).unwrap();
        assert_eq!(res.find("where").str(), "relative");
    }

    #[test]
    fn test_absolute_url_bypasses_base() {
        const PATH: &str = "session_options/base_url/absolute";
        let _handle = crate::add_hyper_fixture(PATH, |_| async {
            (crate::json_response(r#"{"where":"absolute"}"#), Ok(()))
        });
        let base = crate::base_url().unwrap();
        let session = Session::builder()
            .base_url("http://127.0.0.1:9/unused/")
            .no_proxy()
            .build()
            .unwrap();
        let res = session.get(&format!("{base}{PATH}"), &json!({})).unwrap();
        assert_eq!(res.find("where").str(), "absolute");
    }

    #[test]
    fn test_relative_url_without_base_is_invalid() {
        let session = Session::builder().no_proxy().build().unwrap();
        let res = session.get("no/base/here", &json!({}));
        assert!(matches!(res, Err(Error::InvalidUrl(_))), "{res:?}");
    }
}
