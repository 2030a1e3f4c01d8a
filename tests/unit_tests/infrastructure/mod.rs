mod environment_test;
mod http_chat_backend_test;
