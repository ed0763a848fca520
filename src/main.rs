#[rocket::launch]
fn rocket() -> _ {
    let rocket = medicine_api::rocket();
    log::info!("starting medicine API server");
    rocket
}
