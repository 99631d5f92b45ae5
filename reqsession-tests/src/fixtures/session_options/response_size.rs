#[cfg(test)]
mod tests {
    use reqsession::Error;
    use serde_json::json;

    use crate::*;

    const PATH: &str = "session_options/response_size";
    const BODY: &str = "0123456789";

    #[test]
    fn test_body_at_limit_is_accepted() {
        let _handle = crate::add_hyper_fixture(PATH, |_| async {
            (crate::json_response(BODY), Ok(()))
        });
        let session = crate::init_builder()
            .unwrap()
            .max_response_buffer_size(10)
            .build()
            .unwrap();
        let res = session.get(PATH, &json!({})).unwrap();
        assert_eq!(res.json(), BODY);
    }

    #[test]
    fn test_body_over_limit_is_rejected() {
        let _handle = crate::add_hyper_fixture("session_options/response_size/over", |_| async {
            (crate::json_response(BODY), Ok(()))
        });
        let session = crate::init_builder()
            .unwrap()
            .max_response_buffer_size(9)
            .build()
            .unwrap();
        let res = session.get("session_options/response_size/over", &json!({}));
        assert!(matches!(res, Err(Error::ResponseTooLarge)), "{res:?}");
    }
}
