//! # 导入导出服务
//!
//! 花名册与台账的 CSV / Excel 互转。CSV 一律 UTF-8、带表头。

use csv::{ReaderBuilder, WriterBuilder};
use entity::students;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};

use crate::error::{DormError, Result};

use super::checks::CheckRecordResponse;
use super::fingerprints::FingerprintBatchRow;
use super::leaves::LeaveResponse;
use super::students::CreateStudentRequest;

/// 学生花名册 CSV 行
#[derive(Debug, Serialize, Deserialize)]
struct StudentCsvRow {
    #[serde(rename = "学号")]
    student_id: String,
    #[serde(rename = "姓名")]
    name: String,
    #[serde(rename = "性别", default)]
    gender: String,
    #[serde(rename = "班级")]
    class_name: String,
    #[serde(rename = "楼栋")]
    building: String,
    #[serde(rename = "园区", default)]
    area: String,
    #[serde(rename = "楼层", default)]
    floor: String,
    #[serde(rename = "房间")]
    room: String,
    #[serde(rename = "床位", default)]
    bed: String,
    #[serde(rename = "辅导员", default)]
    counselor_name: String,
    #[serde(rename = "辅导员电话", default)]
    counselor_phone: String,
}

/// 指纹映射 CSV 行
#[derive(Debug, Deserialize)]
struct FingerprintCsvRow {
    #[serde(rename = "学号")]
    student_id: String,
    #[serde(rename = "设备号")]
    device_id: String,
    #[serde(rename = "指纹槽位")]
    fingerprint_id: i32,
    #[serde(rename = "手指序号", default)]
    finger_index: Option<i32>,
}

/// 解析学生花名册 CSV
pub fn parse_students_csv(content: &str) -> Result<Vec<CreateStudentRequest>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize().enumerate() {
        let row: StudentCsvRow = record.map_err(|e| {
            DormError::validation(format!("CSV 第 {} 行解析失败: {e}", idx + 2))
        })?;
        rows.push(CreateStudentRequest {
            student_id: row.student_id.trim().to_string(),
            name: row.name.trim().to_string(),
            gender: row.gender,
            class_name: row.class_name,
            building: row.building,
            area: row.area,
            floor: row.floor,
            room: row.room,
            bed: row.bed,
            counselor_name: row.counselor_name,
            counselor_phone: row.counselor_phone,
        });
    }
    Ok(rows)
}

/// 解析指纹映射 CSV
pub fn parse_fingerprints_csv(content: &str) -> Result<Vec<FingerprintBatchRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize().enumerate() {
        let row: FingerprintCsvRow = record.map_err(|e| {
            DormError::validation(format!("CSV 第 {} 行解析失败: {e}", idx + 2))
        })?;
        rows.push(FingerprintBatchRow {
            student_id: row.student_id.trim().to_string(),
            device_id: row.device_id.trim().to_string(),
            fingerprint_id: row.fingerprint_id,
            finger_index: row.finger_index,
        });
    }
    Ok(rows)
}

fn csv_to_string(writer: WriterBuilder, write: impl FnOnce(&mut csv::Writer<Vec<u8>>) -> Result<()>) -> Result<String> {
    let mut inner = writer.from_writer(Vec::new());
    write(&mut inner)?;
    let bytes = inner
        .into_inner()
        .map_err(|e| DormError::internal_with_source("CSV 写出失败", e))?;
    String::from_utf8(bytes).map_err(|e| DormError::internal_with_source("CSV 编码失败", e))
}

/// 学生花名册导出为 CSV
pub fn students_to_csv(students: &[students::Model]) -> Result<String> {
    csv_to_string(WriterBuilder::new(), |writer| {
        for student in students {
            writer
                .serialize(StudentCsvRow {
                    student_id: student.student_id.clone(),
                    name: student.name.clone(),
                    gender: student.gender.clone(),
                    class_name: student.class_name.clone(),
                    building: student.building.clone(),
                    area: student.area.clone(),
                    floor: student.floor.clone(),
                    room: student.room.clone(),
                    bed: student.bed.clone(),
                    counselor_name: student.counselor_name.clone(),
                    counselor_phone: student.counselor_phone.clone(),
                })
                .map_err(|e| DormError::internal_with_source("CSV 序列化失败", e))?;
        }
        Ok(())
    })
}

/// 请假台账导出为 CSV
pub fn leaves_to_csv(leaves: &[LeaveResponse]) -> Result<String> {
    csv_to_string(WriterBuilder::new(), |writer| {
        writer
            .write_record([
                "编号", "学号", "姓名", "班级", "请假日期", "事由", "状态", "申请时间", "审核人",
                "审核时间",
            ])
            .map_err(|e| DormError::internal_with_source("CSV 写出失败", e))?;
        for leave in leaves {
            writer
                .write_record([
                    leave.id.to_string(),
                    leave.student_id.clone(),
                    leave.student_name.clone(),
                    leave.class_name.clone(),
                    leave.leave_dates.join(" "),
                    leave.reason.clone(),
                    leave.status_label.clone(),
                    leave.apply_time.clone(),
                    leave.reviewer.clone().unwrap_or_default(),
                    leave.review_time.clone().unwrap_or_default(),
                ])
                .map_err(|e| DormError::internal_with_source("CSV 写出失败", e))?;
        }
        Ok(())
    })
}

/// 签到记录导出为 CSV
pub fn checks_to_csv(records: &[CheckRecordResponse]) -> Result<String> {
    csv_to_string(WriterBuilder::new(), |writer| {
        writer
            .write_record(["编号", "学号", "状态", "签到时间", "记录来源"])
            .map_err(|e| DormError::internal_with_source("CSV 写出失败", e))?;
        for record in records {
            writer
                .write_record([
                    record.id.to_string(),
                    record.student_id.clone(),
                    record.status.clone(),
                    record.check_time.clone(),
                    record.recorder.clone(),
                ])
                .map_err(|e| DormError::internal_with_source("CSV 写出失败", e))?;
        }
        Ok(())
    })
}

/// 学生花名册导出为 Excel
pub fn students_to_xlsx(students: &[students::Model]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let header_fmt = Format::new().set_bold();

    let headers = [
        "学号", "姓名", "性别", "班级", "楼栋", "园区", "楼层", "房间", "床位", "辅导员",
        "辅导员电话",
    ];
    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_fmt)
            .map_err(|e| DormError::internal_with_source("Excel 写出失败", e))?;
    }

    for (idx, student) in students.iter().enumerate() {
        let row = (idx + 1) as u32;
        let cells = [
            &student.student_id,
            &student.name,
            &student.gender,
            &student.class_name,
            &student.building,
            &student.area,
            &student.floor,
            &student.room,
            &student.bed,
            &student.counselor_name,
            &student.counselor_phone,
        ];
        for (col, value) in cells.iter().enumerate() {
            worksheet
                .write_string(row, col as u16, value.as_str())
                .map_err(|e| DormError::internal_with_source("Excel 写出失败", e))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| DormError::internal_with_source("Excel 写出失败", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ROSTER: &str = "\
学号,姓名,性别,班级,楼栋,园区,楼层,房间,床位,辅导员,辅导员电话
20230001,张三,男,软件2301,6号楼,东区,3,302,2,王老师,13800138000
20230002,李四,女,软件2301,6号楼,东区,3,303,1,王老师,13800138000
";

    #[test]
    fn parse_students_round_trip() {
        let rows = parse_students_csv(ROSTER).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].student_id, "20230001");
        assert_eq!(rows[1].name, "李四");
        assert_eq!(rows[0].counselor_phone, "13800138000");
    }

    #[test]
    fn parse_reports_bad_row_number() {
        let bad = "学号,姓名,班级,楼栋,房间\n20230001,张三,软件2301,6号楼,302\n,,\n";
        let err = parse_students_csv(bad).unwrap_err();
        assert!(err.to_string().contains("第 3 行"));
    }

    #[test]
    fn parse_fingerprints_csv_rows() {
        let content = "\
学号,设备号,指纹槽位,手指序号
20230001,FP-A-01,5,1
20230002,FP-A-01,6,
";
        let rows = parse_fingerprints_csv(content).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fingerprint_id, 5);
        assert_eq!(rows[1].finger_index, None);
    }

    #[test]
    fn students_csv_export_has_header() {
        let student = students::Model {
            id: 1,
            student_id: "20230001".to_string(),
            name: "张三".to_string(),
            gender: "男".to_string(),
            class_name: "软件2301".to_string(),
            building: "6号楼".to_string(),
            area: "东区".to_string(),
            floor: "3".to_string(),
            room: "302".to_string(),
            bed: "2".to_string(),
            counselor_name: "王老师".to_string(),
            counselor_phone: "13800138000".to_string(),
            created_at: chrono::Utc::now().naive_utc(),
            updated_at: chrono::Utc::now().naive_utc(),
        };
        let csv = students_to_csv(&[student]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "学号,姓名,性别,班级,楼栋,园区,楼层,房间,床位,辅导员,辅导员电话"
        );
        assert!(lines.next().unwrap().starts_with("20230001,张三"));
    }

    #[test]
    fn xlsx_export_produces_zip_payload() {
        let buffer = students_to_xlsx(&[]).unwrap();
        // xlsx 实为 zip 容器
        assert_eq!(&buffer[..2], b"PK");
    }
}
