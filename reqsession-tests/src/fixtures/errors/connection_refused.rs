#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqsession::{Error, Session};
    use serde_json::json;

    fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}/closed")
    }

    #[test]
    fn test_connection_refused_is_a_transport_error() {
        let session = Session::builder().no_proxy().build().unwrap();
        let res = session.post(&closed_port_url(), &json!({"a": 1}));
        assert!(matches!(res, Err(Error::Transport(_))), "{res:?}");
    }

    #[test]
    fn test_connection_refused_degrades_to_empty_body() {
        let session = Session::builder().no_proxy().build().unwrap();
        let res = session.get(&closed_port_url(), &()).unwrap_or_default();
        assert_eq!(res.json(), "");
        assert!(!res.find("anything").exists());
    }
}
