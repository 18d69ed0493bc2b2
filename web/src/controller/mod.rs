pub(crate) mod broadcast_controller;
pub(crate) mod health_check_controller;
pub(crate) mod poster_controller;
