#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, OnceLock};

    use futures::StreamExt as _;
    use http_body_util::BodyStream;
    use multer::Multipart;
    use serde_json::json;

    use crate::*;

    const TEST_CONTENT: &[u8] = b"0123456789";

    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    struct FormItem {
        name: String,
        file_name: String,
        content_type: String,
        bytes: Bytes,
    }

    type Received = Arc<OnceLock<(Vec<FormItem>, String)>>;

    fn multipart_fixture(path: &str, received: &Received) -> crate::HyperFixtureHandle {
        crate::add_hyper_fixture(path, {
            let received = Arc::clone(received);
            move |req: Request<body::Incoming>| {
                let received = Arc::clone(&received);
                async move {
                    let content_type = req.header_str("content-type").to_owned();
                    let boundary = multer::parse_boundary(&content_type).unwrap_or_default();

                    let body_stream =
                        BodyStream::new(req.into_body()).filter_map(|result| async move {
                            result.map(|frame| frame.into_data().ok()).transpose()
                        });

                    let mut multipart = Multipart::new(body_stream, boundary);
                    let mut form_items = vec![];
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        form_items.push(FormItem {
                            name: field.name().unwrap_or_default().to_owned(),
                            file_name: field.file_name().unwrap_or("not_a_file").into(),
                            content_type: field
                                .content_type()
                                .map(|mime| mime.to_string())
                                .unwrap_or_default(),
                            bytes: field.bytes().await.unwrap_or_default(),
                        });
                    }
                    received.set((form_items, content_type)).ok();
                    (crate::json_response(r#"{"uploaded":true}"#), Ok(()))
                }
            }
        })
    }

    fn ten_byte_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TEST_CONTENT).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_upload_file() {
        const PATH: &str = "multipart/upload_file";
        let received = Received::default();
        let _handle = multipart_fixture(PATH, &received);
        let _echo = crate::add_hyper_fixture("multipart/after_upload", crate::echo_handler);

        let file = ten_byte_file();
        let mut session = crate::init_builder().unwrap().build().unwrap();
        session.add_header("Content-Type", "application/json");

        let res = session
            .upload_file(PATH, "file", file.path(), [("name", "t")])
            .unwrap();
        assert!(res.find("uploaded").bool());

        let (items, content_type) = received.get().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            FormItem {
                name: "file".to_owned(),
                file_name: file.path().file_name().unwrap().to_str().unwrap().to_owned(),
                content_type: "application/octet-stream".to_owned(),
                bytes: Bytes::from_static(TEST_CONTENT),
            }
        );
        assert_eq!(
            items[1],
            FormItem {
                name: "name".to_owned(),
                file_name: "not_a_file".to_owned(),
                content_type: String::new(),
                bytes: Bytes::from_static(b"t"),
            }
        );

        // The session keeps announcing the multipart content type afterwards.
        assert_eq!(&session.headers()["Content-Type"], content_type);
        let res = session.post("multipart/after_upload", &json!({})).unwrap();
        assert_eq!(res.find("headers.content-type").str(), content_type);
    }

    #[test]
    fn test_upload_file_scoped() {
        const PATH: &str = "multipart/upload_file_scoped";
        let received = Received::default();
        let _handle = multipart_fixture(PATH, &received);

        let file = ten_byte_file();
        let session = crate::init_builder().unwrap().build().unwrap();
        session
            .upload_file_scoped(PATH, "attachment", file.path(), Vec::<(String, String)>::new())
            .unwrap();

        let (items, content_type) = received.get().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "attachment");
        assert_eq!(items[0].bytes, TEST_CONTENT);
        assert!(session.headers().is_empty());
    }

    #[test]
    fn test_part_names_are_sent_verbatim() {
        const PATH: &str = "multipart/verbatim_names";
        let received = Received::default();
        let _handle = multipart_fixture(PATH, &received);

        let file = ten_byte_file();
        let session = crate::init_builder().unwrap().build().unwrap();
        session
            .upload_file_scoped(
                PATH,
                "attachments/0",
                file.path(),
                [("meta/id", "1"), ("tags[]", "a b")],
            )
            .unwrap();

        let (items, _) = received.get().unwrap();
        let names: Vec<&str> = items.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, ["attachments/0", "meta/id", "tags[]"]);
        assert_eq!(items[2].bytes, "a b".as_bytes());
    }
}
