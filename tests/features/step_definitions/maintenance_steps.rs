//! Maintenance request steps

use cucumber::when;

use crate::common::MultipartForm;
use crate::features::support::TestWorld;

#[when(expr = "{word} files a maintenance request for {string}")]
async fn file_request(world: &mut TestWorld, name: String, department: String) {
    let account = world.account(&name);
    let department_id = world.department(&department);

    let response = world
        .app()
        .multipart_as(
            &account.token,
            "POST",
            "/api/maintenance-requests",
            MultipartForm::new()
                .text("department_id", &department_id.to_string())
                .text("title", "Broken radiator"),
        )
        .await;
    world.last_response = Some(response);
}
