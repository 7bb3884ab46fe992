use std::{env, fs, path::Path, process};

use ts_rs::TS;

const HEADER: &str = "// This file was generated by `cargo run --bin generate_types`.\n// Do not edit manually.\n\n";

fn generate_types_content() -> String {
    let decls: Vec<String> = vec![
        utils::response::ApiResponse::<()>::decl(),
        db::models::company::Company::decl(),
        db::models::company::CreateCompany::decl(),
        db::models::company::UpdateCompany::decl(),
        db::models::profile::UserRole::decl(),
        db::models::profile::Profile::decl(),
        db::models::profile::UpdateProfile::decl(),
        db::models::customer::Customer::decl(),
        db::models::customer::CreateCustomer::decl(),
        db::models::customer::UpdateCustomer::decl(),
        db::models::property::PropertyType::decl(),
        db::models::property::Property::decl(),
        db::models::property::CreateProperty::decl(),
        db::models::property::UpdateProperty::decl(),
        db::models::unit::UnitType::decl(),
        db::models::unit::WaterType::decl(),
        db::models::unit::Unit::decl(),
        db::models::unit::CreateUnit::decl(),
        db::models::unit::UpdateUnit::decl(),
        db::models::service::ServiceType::decl(),
        db::models::service::ServiceStatus::decl(),
        db::models::service::Service::decl(),
        db::models::service::ServiceWithLocation::decl(),
        db::models::service::CreateService::decl(),
        db::models::service::UpdateService::decl(),
        db::models::service::ServiceFilter::decl(),
        server::routes::service_visits::CompleteService::decl(),
        db::models::water_test::WaterReadings::decl(),
        db::models::water_test::WaterTest::decl(),
        db::models::water_test::CreateWaterTest::decl(),
        server::routes::water_tests::EvaluatedWaterTest::decl(),
        db::models::chemical_addition::ChemicalAddition::decl(),
        db::models::chemical_addition::CreateChemicalAddition::decl(),
        services::services::chemistry::Parameter::decl(),
        services::services::chemistry::Level::decl(),
        services::services::chemistry::Range::decl(),
        services::services::chemistry::TargetRanges::decl(),
        services::services::chemistry::ParameterCheck::decl(),
        services::services::chemistry::LsiStatus::decl(),
        services::services::chemistry::WaterBalance::decl(),
        services::services::chemistry::DosingRecommendation::decl(),
        services::services::chemistry::DosingPlan::decl(),
        db::models::equipment::EquipmentType::decl(),
        db::models::equipment::Equipment::decl(),
        db::models::equipment::CreateEquipment::decl(),
        db::models::equipment::UpdateEquipment::decl(),
        db::models::equipment::EquipmentFilter::decl(),
        db::models::equipment_failure::FailureSeverity::decl(),
        db::models::equipment_failure::EquipmentFailure::decl(),
        db::models::equipment_failure::CreateEquipmentFailure::decl(),
        db::models::equipment_failure::UpdateEquipmentFailure::decl(),
        db::models::equipment_maintenance_log::EquipmentMaintenanceLog::decl(),
        db::models::equipment_maintenance_log::CreateEquipmentMaintenanceLog::decl(),
        db::models::plant_room::PlantRoom::decl(),
        db::models::plant_room::CreatePlantRoom::decl(),
        db::models::plant_room::UpdatePlantRoom::decl(),
        db::models::plant_room_check::PlantRoomCheck::decl(),
        db::models::plant_room_check::CreatePlantRoomCheck::decl(),
        db::models::scheduling_rule::RuleFrequency::decl(),
        db::models::scheduling_rule::SchedulingRule::decl(),
        db::models::scheduling_rule::CreateSchedulingRule::decl(),
        db::models::scheduling_rule::UpdateSchedulingRule::decl(),
        db::models::template::Template::decl(),
        db::models::template::CreateTemplate::decl(),
        db::models::template::UpdateTemplate::decl(),
        db::models::team_invitation::InvitationStatus::decl(),
        db::models::team_invitation::TeamInvitation::decl(),
        db::models::team_invitation::CreateTeamInvitation::decl(),
        db::models::team_invitation::AcceptTeamInvitation::decl(),
        server::routes::team::UpdateMemberRole::decl(),
        db::models::job::JobStatus::decl(),
        db::models::job::JobPriority::decl(),
        db::models::job::Job::decl(),
        db::models::job::CreateJob::decl(),
        db::models::job::UpdateJob::decl(),
        db::models::job::JobFilter::decl(),
        db::models::booking::BookingStatus::decl(),
        db::models::booking::Booking::decl(),
        db::models::booking::CreateBooking::decl(),
        db::models::booking::UpdateBooking::decl(),
        db::models::booking::BookingFilter::decl(),
        db::models::dashboard::DashboardSummary::decl(),
        db::models::report::EquipmentFailureSummary::decl(),
        db::models::report::ReportRange::decl(),
        db::models::report::StatusTotals::decl(),
        db::models::report::TechnicianTotal::decl(),
        db::models::report::ChemicalTotal::decl(),
        db::models::report::ServiceReport::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|decl| {
            let trimmed = decl.trim_start();
            if trimmed.starts_with("export") {
                decl
            } else {
                format!("export {trimmed}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{HEADER}{body}\n")
}

fn main() {
    let check_mode = env::args().any(|arg| arg == "--check");
    let shared_path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../../shared"));
    let types_path = shared_path.join("types.ts");
    let generated = generate_types_content();

    if check_mode {
        match fs::read_to_string(&types_path) {
            Ok(current) if current == generated => {
                println!("✅ shared/types.ts is up to date.");
            }
            _ => {
                eprintln!("❌ shared/types.ts is not up to date. Run `cargo run --bin generate_types`.");
                process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = fs::create_dir_all(shared_path).and_then(|_| fs::write(&types_path, generated)) {
        eprintln!("Failed to write {}: {e}", types_path.display());
        process::exit(1);
    }
    println!("✅ TypeScript types written to {}", types_path.display());
}
