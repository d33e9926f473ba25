//! Seed data: a small built-in course catalog that guarantees the planner
//! is useful even without external config or a generative-text key.

use crate::domain::{Course, Level};

fn course(
  id: &str,
  title: &str,
  subtitle: &str,
  description: &str,
  level: Level,
  categories: &[&str],
  rating: f32,
  duration: &str,
  will_learn: &[&str],
  price: f64,
) -> Course {
  Course {
    id: id.into(),
    title: title.into(),
    subtitle: subtitle.into(),
    description: description.into(),
    level,
    categories: categories.iter().map(|s| (*s).to_string()).collect(),
    rating,
    duration: duration.into(),
    will_learn: will_learn.iter().map(|s| (*s).to_string()).collect(),
    thumbnail: format!("/media/thumbs/{}.jpg", id),
    price,
    active: true,
  }
}

/// Minimal catalog spanning every level and a few category clusters.
/// Ids are fixed v4 literals so ingested custom plans can reference them.
pub fn seed_courses() -> Vec<Course> {
  vec![
    course(
      "5e9cbf4e-8f3a-4f0e-9b2a-0d6e4a1c2b31",
      "HTML & CSS cho người mới",
      "Xây trang web đầu tiên của bạn",
      "Khóa học nền tảng về HTML5 và CSS3: cấu trúc trang, semantic tags, \
       flexbox, grid và responsive layout. Không yêu cầu kinh nghiệm lập trình.",
      Level::Beginner,
      &["web"],
      4.6,
      "8h 30m",
      &["Cấu trúc HTML5", "Flexbox & Grid", "Responsive design"],
      249_000.0,
    ),
    course(
      "1b7d2c9a-3e5f-4a8b-b1c0-7f2d9e4a6c52",
      "JavaScript căn bản",
      "Từ biến số đến DOM",
      "Làm quen với JavaScript hiện đại: kiểu dữ liệu, hàm, vòng lặp, sự kiện \
       và thao tác DOM qua các bài tập nhỏ.",
      Level::Beginner,
      &["web", "programming"],
      4.4,
      "10h",
      &["Cú pháp ES6", "Thao tác DOM", "Xử lý sự kiện"],
      299_000.0,
    ),
    course(
      "9a4f6e1d-2b8c-4d7a-a3e5-5c1b8f0d7e93",
      "Python nhập môn",
      "Lập trình cho mọi người",
      "Khóa Python đầu tiên: cú pháp, cấu trúc dữ liệu, file I/O và một dự án \
       nhỏ xử lý dữ liệu thực tế.",
      Level::Beginner,
      &["programming", "data"],
      4.7,
      "12h",
      &["Cú pháp Python", "List & Dict", "Dự án mini"],
      0.0,
    ),
    course(
      "c3e8d5b2-7a1f-4c6e-8d9b-2e4f7a0c5d14",
      "React từ cơ bản đến thành thạo",
      "Component, hooks và state",
      "Xây dựng SPA với React: component hóa giao diện, hooks, quản lý state, \
       routing và gọi API. Yêu cầu biết JavaScript.",
      Level::Intermediate,
      &["web"],
      4.5,
      "15h 30m",
      &["Component & props", "Hooks", "React Router", "Fetch API"],
      499_000.0,
    ),
    course(
      "7f2a9c4e-6d3b-4e8f-9a1c-8b5d2f7e0a36",
      "Node.js và Express",
      "Backend JavaScript thực chiến",
      "Thiết kế REST API với Express, middleware, xác thực JWT và kết nối \
       MongoDB.",
      Level::Intermediate,
      &["web", "backend"],
      4.3,
      "14h",
      &["REST API", "Middleware", "JWT", "MongoDB"],
      459_000.0,
    ),
    course(
      "2d8b5f0a-9c4e-4b7d-8e2f-1a6c9d3b5e78",
      "Phân tích dữ liệu với Pandas",
      "Từ bảng tính đến DataFrame",
      "Làm sạch, biến đổi và trực quan hóa dữ liệu với Pandas và Matplotlib \
       qua các bộ dữ liệu Việt Nam.",
      Level::Intermediate,
      &["data"],
      4.6,
      "11h 45m",
      &["DataFrame", "GroupBy", "Trực quan hóa"],
      399_000.0,
    ),
    course(
      "e5c1a8d4-3f7b-4a2e-b6d8-9e0f4c2a7b59",
      "Kiến trúc microservices",
      "Thiết kế hệ thống phân tán",
      "Tách monolith thành microservices: ranh giới service, giao tiếp bất \
       đồng bộ, observability và chiến lược triển khai.",
      Level::Advanced,
      &["backend", "architecture"],
      4.8,
      "18h",
      &["Service boundaries", "Message queue", "Observability"],
      799_000.0,
    ),
    course(
      "6a3e7c2f-8b5d-4f9a-a0e4-3c7b1d8f2e95",
      "Machine Learning ứng dụng",
      "Mô hình hóa bài toán thực tế",
      "Pipeline ML đầy đủ: chuẩn bị dữ liệu, chọn mô hình, đánh giá và đưa \
       vào sản phẩm với scikit-learn.",
      Level::Advanced,
      &["data", "ai"],
      4.7,
      "20h",
      &["Feature engineering", "Model selection", "Deployment"],
      899_000.0,
    ),
    course(
      "4b9d2e7a-1c6f-4d3b-9f8a-5e2c7a0d4b16",
      "Tối ưu hiệu năng hệ thống lớn",
      "Profiling, caching và tải cao",
      "Chẩn đoán nghẽn cổ chai ở tầng ứng dụng và cơ sở dữ liệu, chiến lược \
       cache nhiều lớp, thiết kế chịu tải cho hàng triệu người dùng.",
      Level::Expert,
      &["backend", "architecture"],
      4.9,
      "16h 30m",
      &["Profiling", "Cache strategy", "Load testing"],
      1_199_000.0,
    ),
    course(
      "8c5f1b6e-4d9a-4e2c-8b7f-0a3d6e9c2f48",
      "Thiết kế UI/UX hiện đại",
      "Từ wireframe đến design system",
      "Nguyên tắc thị giác, nghiên cứu người dùng, prototyping với Figma và \
       xây dựng design system tái sử dụng.",
      Level::Beginner,
      &["design"],
      4.5,
      "9h",
      &["Wireframe", "Figma", "Design system"],
      349_000.0,
    ),
  ]
}
