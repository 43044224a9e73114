pub mod post_server;
