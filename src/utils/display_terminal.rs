//! 터미널 출력 포맷팅 유틸리티
//!
//! 서버 기동 과정(레지스트리 초기화, 서버 배너)을 터미널에 보기 좋게 출력합니다.
//! 로그 레벨과 무관하게 항상 표준 출력으로 나갑니다.

const BOX_WIDTH: usize = 50;

/// 박스 형태의 제목을 출력합니다.
///
/// ```text
/// ╔══════════════════════════════════════════════════╗
/// ║         🔄 INITIALIZING SERVICE REGISTRY          ║
/// ╚══════════════════════════════════════════════════╝
/// ```
pub fn print_boxed_title(title: &str) {
    let border = "═".repeat(BOX_WIDTH);

    println!("╔{}╗", border);
    println!("║{:^49}║", title);
    println!("╚{}╝", border);
}

pub fn print_step_start(step: u8, description: &str) {
    println!("→ Step {}: {}", step, description);
}

pub fn print_step_complete(step: u8, description: &str, count: usize) {
    println!("✓ Step {}: {} ({} items)", step, description, count);
}

pub fn print_sub_task(name: &str, status: &str) {
    println!("   ├─ {}: {}", name, status);
}

pub fn print_final_summary(repos: usize, services: usize) {
    println!();
    print_boxed_title("🎉 SERVICE REGISTRY INITIALIZED");
    println!("   📦 Repository hooks: {}", repos);
    println!("   🔧 Service hooks: {}", services);
    println!();
}

/// 서버 시작 배너
///
/// 바인딩 주소와 주요 엔드포인트를 안내합니다.
pub fn print_server_banner(host: &str, port: u16, environment: &str) {
    print_boxed_title("🚀 AUTH GATEWAY STARTED");
    println!("   🌐 Listening: http://{}:{}", host, port);
    println!("   🏷️  Environment: {}", environment);
    println!("   🔑 Google login: POST /api/v1/auth/google-login");
    println!("   ❤️  Health: GET /health");
    println!();
}
