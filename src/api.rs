use rocket::Route;

mod voter;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(voter::routes());
    routes.extend(voting::routes());
    routes
}
