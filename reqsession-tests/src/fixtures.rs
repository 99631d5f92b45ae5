mod errors {
    mod connection_refused;
    mod invalid_json;
}
mod multipart;
mod scenarios {
    mod login_flow;
    mod request_header_override;
    mod runtime_contexts;
}
mod session_options {
    mod base_url;
    mod certificate_errors;
    mod cookies;
    mod headers;
    mod response_size;
    mod user_agent;
}
